use crate::domain::model::RecommendationResult;
use crate::domain::ports::{Recommender, Storage};
use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::validate_columns;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const CONTEXT_COLUMN: &str = "context";
pub const CONVERSATION_COLUMN: &str = "conversation";
pub const RECOMMENDATIONS_COLUMN: &str = "model_recommendations";
pub const MESSAGE_COLUMN: &str = "model_message";

const TASK_FAILED_MESSAGE: &str = "Something went wrong while generating recommendations.";

/// Input rows, header first, as read from the dataset CSV.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    context_idx: usize,
    conversation_idx: usize,
}

impl Dataset {
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        validate_columns("input", &headers, &[CONTEXT_COLUMN, CONVERSATION_COLUMN])?;

        let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
        let context_idx = position(CONTEXT_COLUMN);
        let conversation_idx = position(CONVERSATION_COLUMN);

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self {
            headers,
            rows,
            context_idx,
            conversation_idx,
        })
    }

    /// Chat text for one row: context, newline, conversation.
    pub fn row_text(&self, row: usize) -> String {
        let cells = &self.rows[row];
        let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or_default();
        format!("{}\n{}", cell(self.context_idx), cell(self.conversation_idx))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub type RowOutcome = (Option<RecommendationResult>, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub output_path: String,
}

/// Replays a dataset through a [`Recommender`] and writes the dataset back
/// out with two extra columns.
pub struct EvaluationEngine<S: Storage, R: Recommender + 'static> {
    storage: S,
    recommender: Arc<R>,
    concurrency: usize,
}

impl<S: Storage, R: Recommender + 'static> EvaluationEngine<S, R> {
    pub fn new(storage: S, recommender: R) -> Self {
        Self {
            storage,
            recommender: Arc::new(recommender),
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, input_path: &str, output_path: &str) -> Result<EvaluationSummary> {
        tracing::info!("Reading dataset from {}", input_path);
        let raw = self.storage.read_file(input_path).await?;
        let dataset = Dataset::from_csv(&raw)?;
        tracing::info!("Loaded {} row(s)", dataset.len());

        let outcomes = self.evaluate(&dataset).await;
        let succeeded = outcomes.iter().filter(|(data, _)| data.is_some()).count();

        let output = write_augmented_csv(&dataset, &outcomes)?;
        tracing::debug!("Writing {} bytes to {}", output.len(), output_path);
        self.storage.write_file(output_path, &output).await?;

        let summary = EvaluationSummary {
            rows: dataset.len(),
            succeeded,
            failed: dataset.len() - succeeded,
            output_path: output_path.to_string(),
        };
        tracing::info!(
            "Evaluation finished: {} row(s), {} succeeded, {} failed",
            summary.rows,
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }

    /// One outcome per row, in row order, with at most `concurrency` calls
    /// in flight.
    pub async fn evaluate(&self, dataset: &Dataset) -> Vec<RowOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for row in 0..dataset.len() {
            let text = dataset.row_text(row);
            let recommender = Arc::clone(&self.recommender);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                tracing::debug!("Evaluating row {}", row + 1);
                (row, recommender.recommend(&text).await)
            });
        }

        let mut outcomes: Vec<Option<RowOutcome>> = vec![None; dataset.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((row, outcome)) => outcomes[row] = Some(outcome),
                Err(e) => tracing::error!("Evaluation task failed: {}", e),
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| outcome.unwrap_or_else(|| (None, TASK_FAILED_MESSAGE.to_string())))
            .collect()
    }
}

/// Input columns plus `model_recommendations` (JSON array, empty when the
/// call failed) and `model_message`. Rows are padded or cut to the header
/// width first.
pub fn write_augmented_csv(dataset: &Dataset, outcomes: &[RowOutcome]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut headers = dataset.headers.clone();
    headers.push(RECOMMENDATIONS_COLUMN.to_string());
    headers.push(MESSAGE_COLUMN.to_string());
    writer.write_record(&headers)?;

    for (cells, (data, message)) in dataset.rows.iter().zip(outcomes) {
        let recommendations = match data.as_ref().and_then(|d| d.recommendations.as_ref()) {
            Some(recs) => serde_json::to_string(recs)?,
            None => String::new(),
        };

        let mut record = cells.clone();
        record.resize(dataset.headers.len(), String::new());
        record.push(recommendations);
        record.push(message.clone());
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| AdvisorError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Recommendation;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AdvisorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    /// Recommends one course named after the text; fails on texts containing "fail".
    struct EchoRecommender;

    #[async_trait]
    impl Recommender for EchoRecommender {
        async fn recommend(&self, text: &str) -> RowOutcome {
            if text.contains("fail") {
                return (None, "The course advisor timed out.".to_string());
            }
            let result = RecommendationResult {
                generated_persona: None,
                recommendations: Some(vec![Recommendation {
                    id: Some("C001".to_string()),
                    title: Some(text.replace('\n', " | ")),
                    reason: None,
                }]),
            };
            (Some(result), format!("msg for {}", text.len()))
        }
    }

    const INPUT: &str = "id,context,conversation\n\
        1,student,I feel stressed\n\
        2,staff,please fail\n\
        3,youth,\"multi\nline\"\n";

    #[test]
    fn test_row_text_joins_context_and_conversation() {
        let dataset = Dataset::from_csv(INPUT.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.row_text(0), "student\nI feel stressed");
        assert_eq!(dataset.row_text(2), "youth\nmulti\nline");
    }

    #[test]
    fn test_short_row_reads_as_empty_cells() {
        let dataset =
            Dataset::from_csv(b"context,conversation,label\na,b\nc\nd,e,f\n").unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.row_text(0), "a\nb");
        assert_eq!(dataset.row_text(1), "c\n");
        assert_eq!(dataset.row_text(2), "d\ne");
    }

    #[test]
    fn test_ragged_rows_fit_header_in_output() {
        let dataset =
            Dataset::from_csv(b"context,conversation,label\na,b\nc,d,e,extra\n").unwrap();
        let outcomes: Vec<RowOutcome> = vec![
            (None, "first".to_string()),
            (None, "second".to_string()),
        ];

        let output = write_augmented_csv(&dataset, &outcomes).unwrap();
        let mut reader = csv::Reader::from_reader(output.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(rows[0].len(), 5);
        assert_eq!(&rows[0][2], "");
        assert_eq!(&rows[0][4], "first");
        assert_eq!(rows[1].len(), 5);
        assert_eq!(&rows[1][2], "e");
        assert_eq!(&rows[1][4], "second");
    }

    #[test]
    fn test_missing_column_rejected() {
        let err = Dataset::from_csv(b"context,text\na,b\n").unwrap_err();
        assert!(err.to_string().contains("conversation"));
    }

    #[tokio::test]
    async fn test_run_appends_columns_in_row_order() {
        let storage = MockStorage::with_file("in.csv", INPUT);
        let engine = EvaluationEngine::new(storage.clone(), EchoRecommender).with_concurrency(3);

        let summary = engine.run("in.csv", "out.csv").await.unwrap();

        assert_eq!(
            summary,
            EvaluationSummary {
                rows: 3,
                succeeded: 2,
                failed: 1,
                output_path: "out.csv".to_string(),
            }
        );

        let output = storage.get_file("out.csv").await.unwrap();
        let mut reader = csv::Reader::from_reader(output.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec![
                "id",
                "context",
                "conversation",
                "model_recommendations",
                "model_message"
            ]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "1");
        assert_eq!(
            &rows[0][3],
            r#"[{"id":"C001","title":"student | I feel stressed"}]"#
        );
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[1][4], "The course advisor timed out.");
        assert_eq!(&rows[2][0], "3");
        assert_eq!(&rows[2][2], "multi\nline");
    }

    #[tokio::test]
    async fn test_run_survives_short_row() {
        let storage = MockStorage::with_file(
            "in.csv",
            "id,context,conversation\n1,student,I feel stressed\n2,staff\n",
        );
        let engine = EvaluationEngine::new(storage.clone(), EchoRecommender);

        let summary = engine.run("in.csv", "out.csv").await.unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.succeeded, 2);

        let output = storage.get_file("out.csv").await.unwrap();
        let mut reader = csv::Reader::from_reader(output.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows[1].len(), 5);
        assert_eq!(&rows[1][2], "");
        assert_eq!(&rows[1][3], r#"[{"id":"C001","title":"staff | "}]"#);
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let storage = MockStorage::with_file("other.csv", INPUT);
        let engine = EvaluationEngine::new(storage, EchoRecommender);

        let err = engine.run("in.csv", "out.csv").await.unwrap_err();
        assert!(matches!(err, AdvisorError::IoError(_)));
    }
}
