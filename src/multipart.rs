//! Reading the `multipart/form-data` bodies used by the catalog endpoints.

use std::{collections::HashMap, str::FromStr};

use axum::extract::Multipart;

use crate::Error;

/// The name of the file field that carries an uploaded image.
pub const IMAGE_FIELD: &str = "image";

/// The text fields and optional image of a multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    image: Option<Vec<u8>>,
}

impl MultipartForm {
    /// Read every field of `multipart` into memory.
    ///
    /// An empty `image` part counts as no image.
    ///
    /// # Errors
    ///
    /// Returns [Error::MultipartError] if the body is not valid multipart data.
    pub async fn read(mut multipart: Multipart) -> Result<Self, Error> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            } else {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The trimmed text of field `name`, or `None` if it is absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
    }

    /// Parse field `name`, or `None` if it is absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] if the field is present but does not parse.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, Error> {
        self.text(name)
            .map(|text| {
                text.parse()
                    .map_err(|_| Error::Validation(format!("Invalid value for {name}: {text}")))
            })
            .transpose()
    }

    /// Take the uploaded image out of the form.
    pub fn take_image(&mut self) -> Option<Vec<u8>> {
        self.image.take()
    }
}
