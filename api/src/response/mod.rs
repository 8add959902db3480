use serde::Serialize;

/// Envelope for every JSON response:
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Ticket created successfully"
/// }
/// ```
///
/// Error responses carry `T::default()` as `data`, usually `null`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}
