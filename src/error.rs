//! Error types for the inventory.

use thiserror::Error;

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the page as alert messages.
///
/// The user-facing variants carry the exact text shown in the browser alert.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Submit attempted without a user tag
    #[error("Vui lòng đăng nhập trước khi thêm vật tư.")]
    NotLoggedIn,

    /// Submit attempted with a blank material name
    #[error("Nhập tên vật tư")]
    MissingName,

    /// Login attempted with neither a name nor an email
    #[error("Nhập tên hoặc email để đăng nhập (demo)")]
    MissingIdentity,

    /// No item carries the requested identifier
    #[error("Không tìm thấy vật tư: {0}")]
    ItemNotFound(String),

    /// Uploaded file is not a recognisable image
    #[error("Tệp tải lên không phải là hình ảnh")]
    UnsupportedImage,

    /// The upload form could not be read
    #[error("Lỗi tải tệp lên: {0}")]
    Upload(String),

    /// The request body went over the configured upload limit
    #[error("Tệp tải lên quá lớn")]
    UploadTooLarge,

    /// Reading or writing a storage slot failed
    #[error("Lỗi lưu trữ: {0}")]
    Storage(#[from] std::io::Error),

    /// A storage slot could not be encoded or decoded
    #[error("Lỗi dữ liệu JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The spreadsheet writer failed
    #[error("Lỗi xuất Excel: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    /// True for failures caused by what the user entered rather than by the
    /// machine: these map to a 400 response and leave nothing to log.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::NotLoggedIn
                | Error::MissingName
                | Error::MissingIdentity
                | Error::ItemNotFound(_)
                | Error::UnsupportedImage
                | Error::Upload(_)
                | Error::UploadTooLarge
        )
    }
}
