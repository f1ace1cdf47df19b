use serde::{Deserialize, Serialize};

pub type EmailId = String;

/// One message as classified by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: EmailId,
    pub from: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    pub routed_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub date: String, // ISO 8601, kept raw
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_spam: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EmailRecord {
    pub fn spam(&self) -> bool {
        self.is_spam.unwrap_or(false)
    }

    pub fn duplicate(&self) -> bool {
        self.is_duplicate.unwrap_or(false)
    }

    /// Value used by the table sort. Empty strings count as missing.
    pub fn sort_value(&self, field: SortField) -> Option<&str> {
        let v = match field {
            SortField::Id => Some(self.id.as_str()),
            SortField::From => Some(self.from.as_str()),
            SortField::Subject => Some(self.subject.as_str()),
            SortField::Body => self.body.as_deref(),
            SortField::ExtractedText => self.extracted_text.as_deref(),
            SortField::RoutedTo => Some(self.routed_to.as_str()),
            SortField::Category => self.category.as_deref(),
            SortField::Date => Some(self.date.as_str()),
        };
        v.filter(|s| !s.is_empty())
    }

    pub fn status_label(&self) -> &'static str {
        match (self.spam(), self.duplicate()) {
            (true, true) => "Spam, Duplicate",
            (true, false) => "Spam",
            (false, true) => "Duplicate",
            (false, false) => "Normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    From,
    Subject,
    Body,
    ExtractedText,
    RoutedTo,
    Category,
    #[default]
    Date,
}

impl SortField {
    pub fn label(self) -> &'static str {
        match self {
            SortField::Id => "Id",
            SortField::From => "From",
            SortField::Subject => "Subject",
            SortField::Body => "Body",
            SortField::ExtractedText => "Extracted Text",
            SortField::RoutedTo => "Routed To",
            SortField::Category => "Category",
            SortField::Date => "Date",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "id" => Ok(SortField::Id),
            "from" => Ok(SortField::From),
            "subject" => Ok(SortField::Subject),
            "body" => Ok(SortField::Body),
            "extracted_text" => Ok(SortField::ExtractedText),
            "routed_to" | "department" => Ok(SortField::RoutedTo),
            "category" => Ok(SortField::Category),
            "date" => Ok(SortField::Date),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

/// Result of the backend health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub message: String,
    pub is_running: bool,
}

impl HealthStatus {
    pub fn offline() -> Self {
        Self {
            message: "API is not running".to_string(),
            is_running: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::EmailRecord;

    pub fn email(id: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            from: format!("{id}@example.com"),
            subject: format!("Subject {id}"),
            body: None,
            extracted_text: None,
            routed_to: "Customer Service".to_string(),
            category: None,
            date: "2025-01-01T00:00:00.000Z".to_string(),
            is_spam: None,
            is_duplicate: None,
            confidence: None,
        }
    }

    pub fn with_category(id: &str, category: &str) -> EmailRecord {
        EmailRecord {
            category: Some(category.to_string()),
            ..email(id)
        }
    }
}
