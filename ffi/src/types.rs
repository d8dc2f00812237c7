//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use act_core::{ActError, CallResult, Dispatcher, ErrorKind, UreqTransport};

/// Opaque handle to a `Dispatcher`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiDispatcher {
    pub(crate) inner: Dispatcher<UreqTransport>,
}

/// Completion callback for `act_call`: `(error, body, response, user_data)`.
///
/// `error` is null on success; `body` and `response` are null on failure.
/// All pointers are borrowed and only valid for the duration of the call.
pub type ActCallback = extern "C" fn(
    error: *const c_char,
    body: *const c_char,
    response: *const FfiHttpResponse,
    user_data: *mut c_void,
);

/// Return status of `act_call` itself, distinct from the call outcome.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiCallStatus {
    /// The callback was invoked exactly once.
    Ok = 0,
    /// No callback was supplied; nothing was dispatched.
    InvalidCallback = 1,
    /// The dispatcher handle was null; the callback was not invoked.
    NullArg = 2,
    /// A panic was caught; the callback was not invoked.
    Panic = 3,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `act_build_request`. The C caller executes the request itself
/// and frees it with `act_free_request`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: *mut c_char,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null for GET requests, whose payload is in the query string.
    pub body: *mut c_char,
    /// Zero means no timeout.
    pub timeout_ms: u64,
    /// Whether the response body is expected to be JSON.
    pub json: bool,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: act_core::HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => c_string(b).into_raw(),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k).into_raw(),
                    value: c_string(v).into_raw(),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: c_string(req.method.as_str().to_string()).into_raw(),
            url: c_string(req.url).into_raw(),
            headers,
            headers_len,
            body,
            timeout_ms: req.timeout.as_millis() as u64,
            json: req.json,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// An HTTP response as seen by the completion callback. Borrowed: the FFI
/// layer owns the memory and releases it when the callback returns.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Error categories reported in `FfiCallResult`.
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    Config = 2,
    Resolution = 3,
    Serialization = 4,
    Transport = 5,
    NullArg = 6,
    Panic = 7,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => FfiErrorCode::Validation,
            ErrorKind::Config => FfiErrorCode::Config,
            ErrorKind::Resolution => FfiErrorCode::Resolution,
            ErrorKind::Serialization => FfiErrorCode::Serialization,
            ErrorKind::Transport => FfiErrorCode::Transport,
        }
    }
}

/// Result envelope for `act_dispatch`.
///
/// On success `error_code` is `Ok`, `error_message` is null, `http_status`
/// holds the response status and `body` the response body. On failure
/// `error_code` names the category, `error_message` is a human-readable C
/// string and `body` is null.
#[repr(C)]
pub struct FfiCallResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub body: *mut c_char,
}

impl FfiCallResult {
    pub(crate) fn from_core(result: CallResult) -> *mut Self {
        let (error, body, response) = result.into_parts();
        if let Some(err) = error {
            return Self::from_error(&err);
        }
        Box::into_raw(Box::new(FfiCallResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: response.map_or(0, |r| r.status),
            body: body.map_or(std::ptr::null_mut(), |b| c_string(b.to_text()).into_raw()),
        }))
    }

    pub(crate) fn from_error(err: &ActError) -> *mut Self {
        Self::failure(err.kind().into(), &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg)
    }

    fn failure(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiCallResult {
            error_code,
            error_message: c_string(msg.to_string()).into_raw(),
            http_status: 0,
            body: std::ptr::null_mut(),
        }))
    }
}

/// Build a `CString`, dropping interior NUL bytes rather than failing.
pub(crate) fn c_string(s: String) -> CString {
    CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}
