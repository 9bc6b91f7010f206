//! Multipart form payload sent to the classification endpoint.

use reqwest::multipart::{Form, Part};

use crate::SelectedFile;

/// Name of the multipart field carrying the uploaded email.
pub const FILE_FIELD: &str = "file";

/// Name of the multipart field carrying pasted email text.
pub const TEXT_FIELD: &str = "text";

/// A single form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(SelectedFile),
}

/// Ordered form fields, mirroring what a browser builds from a `<form>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form holding only the `text` field.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut form = Self::new();
        form.append(TEXT_FIELD, FormValue::Text(text.into()));
        form
    }

    /// Add a field, keeping any existing fields with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.push((name.into(), value));
    }

    /// Replace every field named `name` with a single value.
    ///
    /// The value takes the position of the first existing field, or goes
    /// last when there was none.
    pub fn set(&mut self, name: &str, value: FormValue) {
        match self.fields.iter().position(|(n, _)| n == name) {
            Some(first) => {
                self.fields[first].1 = value;
                let mut index = 0;
                self.fields.retain(|(n, _)| {
                    let keep = index <= first || n != name;
                    index += 1;
                    keep
                });
            }
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn set_file(&mut self, file: SelectedFile) {
        self.set(FILE_FIELD, FormValue::File(file));
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn text(&self) -> Option<&str> {
        match self.get(TEXT_FIELD) {
            Some(FormValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        match self.get(FILE_FIELD) {
            Some(FormValue::File(file)) => Some(file),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert into a reqwest multipart body.
    pub fn into_multipart(self) -> Form {
        self.fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File(file) => {
                    let (file_name, data) = file.into_parts();
                    form.part(name, Part::bytes(data).file_name(file_name))
                }
            })
    }
}
