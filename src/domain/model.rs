use serde::{Deserialize, Serialize};

/// One course in the catalog handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Terms that should suppress matching this course.
    #[serde(default)]
    pub stopwords: Vec<String>,
    #[serde(default)]
    pub domains: CourseDomains,
}

/// Sub-topic name to related terms. `preserve_order` keeps file order, so the
/// catalog serializes back exactly as it was supplied.
pub type CourseDomains = serde_json::Map<String, serde_json::Value>;

/// Persona extracted by the model. Every field is optional; defaults are the
/// formatter's business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub expressed_feelings: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub reported_challenges: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub expressed_goals: Option<Vec<String>>,
}

impl Persona {
    pub fn first_feeling(&self) -> Option<&str> {
        first_non_blank(&self.expressed_feelings)
    }

    pub fn first_challenge(&self) -> Option<&str> {
        first_non_blank(&self.reported_challenges)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Expected to name a catalog course; not checked on decode.
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub reason: Option<String>,
}

/// Parsed reply of one advisory call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(
        default,
        deserialize_with = "lenient::persona",
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_persona: Option<Persona>,
    #[serde(
        default,
        deserialize_with = "lenient::recommendations",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommendations: Option<Vec<Recommendation>>,
}

impl RecommendationResult {
    pub fn persona(&self) -> Option<&Persona> {
        self.generated_persona.as_ref()
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        self.recommendations.as_deref().unwrap_or_default()
    }

    /// Recommendation ids that do not appear in `catalog`, in reply order.
    /// Entries without an id are not reported.
    pub fn unknown_ids<'a>(&'a self, catalog: &[CourseEntry]) -> Vec<&'a str> {
        self.recommendations()
            .iter()
            .filter_map(|rec| rec.id.as_deref())
            .filter(|id| !catalog.iter().any(|course| course.id == *id))
            .collect()
    }
}

fn first_non_blank(values: &Option<Vec<String>>) -> Option<&str> {
    values
        .as_deref()
        .and_then(|v| v.first())
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Field decoders that turn wrong-typed values into `None` instead of
/// failing the whole reply.
mod lenient {
    use super::{Persona, Recommendation};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            // A bare string where a list was asked for.
            Some(Value::String(s)) => Some(vec![s]),
            _ => None,
        })
    }

    pub fn persona<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Persona>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }

    pub fn recommendations<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Vec<Recommendation>>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).unwrap_or_default())
                    .collect(),
            ),
            _ => None,
        })
    }
}
