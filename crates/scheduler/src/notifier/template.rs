//! HTML email templates with `{{name}}` placeholders.
//!
//! Values are HTML-escaped. A placeholder the template uses but the value set does not
//! provide is an error, never an empty string.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const UNASSIGNED_EXERCISE_TEMPLATE: &str = "unassigned_exercise_reminder";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Email template '{name}' not found at {}", .path.display())]
    Missing { name: String, path: PathBuf },

    #[error("Failed to read email template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Email template '{name}' uses unknown placeholder {{{{{placeholder}}}}}")]
    UnknownPlaceholder { name: String, placeholder: String },

    #[error("Email template '{name}' has an unterminated placeholder")]
    Unterminated { name: String },
}

/// A typed set of values for one template.
pub trait Placeholders {
    fn values(&self) -> Vec<(&'static str, String)>;
}

/// Values for the unassigned-exercise reminder email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEmail {
    pub tutor_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub link: String,
    pub contact_email: String,
    pub contact_phone: String,
}

impl Placeholders for ReminderEmail {
    fn values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tutor_name", self.tutor_name.clone()),
            ("date", self.date.clone()),
            ("start_time", self.start_time.clone()),
            ("end_time", self.end_time.clone()),
            ("link", self.link.clone()),
            ("contact_email", self.contact_email.clone()),
            ("contact_phone", self.contact_phone.clone()),
        ]
    }
}

/// Loads `<dir>/<name>.html` on every render so templates can be edited without a restart.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    dir: PathBuf,
}

impl EmailTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.html", name))
    }

    pub async fn render<P: Placeholders + Sync>(&self, name: &str, values: &P) -> Result<String, TemplateError> {
        let path = self.path_for(name);
        let source = load(name, &path).await?;
        render_template(name, &source, values)
    }
}

async fn load(name: &str, path: &Path) -> Result<String, TemplateError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            TemplateError::Missing {
                name: name.to_string(),
                path: path.to_path_buf(),
            }
        } else {
            TemplateError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub fn render_template<P: Placeholders + ?Sized>(
    name: &str,
    source: &str,
    values: &P,
) -> Result<String, TemplateError> {
    let values: HashMap<&str, String> = values.values().into_iter().collect();

    let mut output = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(open) = rest.find("{{") {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open.find("}}").ok_or_else(|| TemplateError::Unterminated {
            name: name.to_string(),
        })?;

        let placeholder = after_open[..close].trim();
        let value = values
            .get(placeholder)
            .ok_or_else(|| TemplateError::UnknownPlaceholder {
                name: name.to_string(),
                placeholder: placeholder.to_string(),
            })?;
        output.push_str(&escape_html(value));
        rest = &after_open[close + 2..];
    }
    output.push_str(rest);

    Ok(output)
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
