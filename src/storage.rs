use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    constants::{IMAGE_TYPES, RECIPE_IMAGE_DIR},
    error::{Error, HtmlError, TypeError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Parses `data:image/<type>;base64,<payload>`.
pub fn decode_data_url(payload: &str) -> Result<DecodedImage, TypeError> {
    let (header, data) = payload
        .trim()
        .split_once(";base64,")
        .ok_or_else(|| TypeError::new("Upload a valid image encoded as a base64 data URL."))?;

    let mime = header
        .strip_prefix("data:")
        .ok_or_else(|| TypeError::new("Upload a valid image encoded as a base64 data URL."))?;

    let extension = IMAGE_TYPES
        .iter()
        .find_map(|(accepted, extension)| (*accepted == mime).then_some(*extension))
        .ok_or_else(|| TypeError::new("Unsupported image type."))?;

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|_| TypeError::new("Image payload is not valid base64."))?;

    if bytes.is_empty() {
        return Err(TypeError::new("The submitted image is empty."));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Recipe images on the local filesystem. Stored names are relative to `root`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }

    pub fn path(&self, name: &str) -> Result<PathBuf, Error> {
        if name.is_empty() || name.starts_with('/') || name.split('/').any(|part| part == "..") {
            return Err(HtmlError::InvalidRequest.new("Invalid media path"));
        }

        Ok(self.root.join(name))
    }

    /// Writes the image, returning its stored name.
    pub async fn save_image(&self, image: &DecodedImage) -> Result<String, Error> {
        let name = format!(
            "{}/{}_{}.{}",
            RECIPE_IMAGE_DIR,
            Utc::now().format("%Y%m%d%H%M%S%f"),
            &Uuid::new_v4().simple().to_string()[..8],
            image.extension
        );

        tokio::fs::create_dir_all(self.root.join(RECIPE_IMAGE_DIR))
            .await
            .map_err(|e| storage_failure("create media directory", e))?;
        tokio::fs::write(self.path(&name)?, &image.bytes)
            .await
            .map_err(|e| storage_failure("write image", e))?;

        log::debug!("Stored image {name}");
        Ok(name)
    }

    /// Removing a file that is already gone is not an error.
    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        match tokio::fs::remove_file(self.path(name)?).await {
            Ok(()) => {
                log::debug!("Removed image {name}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_failure("remove image", e)),
        }
    }
}

fn storage_failure(action: &str, e: std::io::Error) -> Error {
    log::error!("Failed to {action}: {e}");
    HtmlError::Internal.new("Internal server error")
}
