//! C-ABI wrapper around `act-core`.
//!
//! # Overview
//! Lets any language with a C FFI call endpoints on other apps by guid.
//! Requests are passed in as JSON text; outcomes come back either through a
//! C completion callback (`act_call`), a result envelope (`act_dispatch`), or
//! as a built request the host executes itself (`act_build_request`).
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `act_call` checks the callback before anything else. A null callback is
//!   a programmer error reported through the return status, never through
//!   the callback.
//! - The C caller owns all returned pointers and must call the matching
//!   `act_free_*` function to release them. Pointers handed to the callback
//!   are borrowed.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use act_core::{ActConfig, CallResult, Dispatcher, HttpResponse, UreqTransport};
use serde_json::Value;
use tracing::error;

use types::*;

// ---------------------------------------------------------------------------
// Dispatcher lifecycle
// ---------------------------------------------------------------------------

/// Create a dispatcher that identifies itself as `widget`.
///
/// `service_map` may be null; otherwise it is the JSON guid → base URL map
/// used instead of guid hostnames. Returns null if `widget` is null, the
/// configuration is invalid, or an internal panic occurs. Free the result
/// with `act_dispatcher_free`.
#[unsafe(no_mangle)]
pub extern "C" fn act_dispatcher_new(
    widget: *const c_char,
    service_map: *const c_char,
) -> *mut FfiDispatcher {
    catch_unwind(|| {
        let Some(widget) = borrow_str(widget) else {
            return std::ptr::null_mut();
        };
        let mut config = ActConfig::new(widget);
        if let Some(map) = borrow_str(service_map) {
            config = config.with_service_map(map);
        }
        into_handle(Dispatcher::new(config, UreqTransport::new()))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a dispatcher configured from `FH_WIDGET`, `FH_HOST_PREFIX` and
/// `FH_SERVICE_MAP`. Returns null if the configuration is invalid.
#[unsafe(no_mangle)]
pub extern "C" fn act_dispatcher_from_env() -> *mut FfiDispatcher {
    catch_unwind(|| into_handle(Dispatcher::from_env())).unwrap_or(std::ptr::null_mut())
}

/// Free a dispatcher. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn act_dispatcher_free(dispatcher: *mut FfiDispatcher) {
    if !dispatcher.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(dispatcher) });
        });
    }
}

fn into_handle(
    dispatcher: Result<Dispatcher<UreqTransport>, act_core::ConfigError>,
) -> *mut FfiDispatcher {
    match dispatcher {
        Ok(inner) => Box::into_raw(Box::new(FfiDispatcher { inner })),
        Err(e) => {
            error!(error = %e, "rejected dispatcher configuration");
            std::ptr::null_mut()
        }
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// Dispatch the JSON call request `params_json` and invoke `callback`
/// exactly once with `(error, body, response, user_data)`.
///
/// A null or unparseable `params_json` is reported through the callback as a
/// missing-params error. The callback is not invoked when the return status
/// is anything other than `Ok`.
#[unsafe(no_mangle)]
pub extern "C" fn act_call(
    dispatcher: *const FfiDispatcher,
    params_json: *const c_char,
    callback: Option<ActCallback>,
    user_data: *mut c_void,
) -> FfiCallStatus {
    let Some(callback) = callback else {
        error!("act_call requires a completion callback");
        return FfiCallStatus::InvalidCallback;
    };
    if dispatcher.is_null() {
        return FfiCallStatus::NullArg;
    }
    catch_unwind(|| {
        let dispatcher = unsafe { &*dispatcher };
        let result = dispatcher.inner.dispatch(&parse_params(params_json));
        deliver(callback, result, user_data);
        FfiCallStatus::Ok
    })
    .unwrap_or(FfiCallStatus::Panic)
}

/// Dispatch the JSON call request `params_json` and return the outcome.
///
/// Free the result with `act_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn act_dispatch(
    dispatcher: *const FfiDispatcher,
    params_json: *const c_char,
) -> *mut FfiCallResult {
    catch_unwind(|| {
        if dispatcher.is_null() {
            return FfiCallResult::null_arg("dispatcher");
        }
        let dispatcher = unsafe { &*dispatcher };
        FfiCallResult::from_core(dispatcher.inner.dispatch(&parse_params(params_json)))
    })
    .unwrap_or_else(|_| FfiCallResult::panic("panic in act_dispatch"))
}

/// Validate, resolve and build the request for `params_json` without sending
/// it.
///
/// Returns null on failure; when `out_error` is non-null it then receives a
/// message the caller frees with `act_free_string`. Free a non-null result
/// with `act_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn act_build_request(
    dispatcher: *const FfiDispatcher,
    params_json: *const c_char,
    out_error: *mut *mut c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if dispatcher.is_null() {
            return std::ptr::null_mut();
        }
        let dispatcher = unsafe { &*dispatcher };
        match dispatcher.inner.prepare(&parse_params(params_json)) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(e) => {
                if !out_error.is_null() {
                    unsafe { *out_error = c_string(e.to_string()).into_raw() };
                }
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Turn a response the host received for an `act_build_request` request into
/// a result envelope. Pass the request's `json` flag through unchanged. A null
/// `body` is treated as empty.
///
/// Free the result with `act_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn act_parse_response(status: u16, body: *const c_char, json: bool) -> *mut FfiCallResult {
    catch_unwind(|| {
        let response = HttpResponse {
            status,
            headers: Vec::new(),
            body: borrow_str(body).unwrap_or_default().to_string(),
        };
        FfiCallResult::from_core(CallResult::from_response(response, json))
    })
    .unwrap_or_else(|_| FfiCallResult::panic("panic in act_parse_response"))
}

/// Hand a `CallResult` to the C callback in `(error, body, response)` order.
fn deliver(callback: ActCallback, result: CallResult, user_data: *mut c_void) {
    let (error, body, response) = result.into_parts();
    let error = error.map(|e| c_string(e.to_string()));
    let body = body.map(|b| c_string(b.to_text()));
    let response_body = response.as_ref().map(|r| c_string(r.body.clone()));
    let response = response
        .as_ref()
        .zip(response_body.as_ref())
        .map(|(r, b)| FfiHttpResponse {
            status: r.status,
            body: b.as_ptr(),
        });

    callback(
        error.as_ref().map_or(std::ptr::null(), |e| e.as_ptr()),
        body.as_ref().map_or(std::ptr::null(), |b| b.as_ptr()),
        response.as_ref().map_or(std::ptr::null(), |r| r as *const FfiHttpResponse),
        user_data,
    );
}

/// Read the call request. Anything that is not valid JSON becomes `null`,
/// which the validator rejects as missing params.
fn parse_params(params_json: *const c_char) -> Value {
    borrow_str(params_json)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null)
}

fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `act_build_request`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn act_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        for s in [req.method, req.url, req.body] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiCallResult` returned by `act_dispatch`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn act_free_result(result: *mut FfiCallResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.body.is_null() {
            drop(unsafe { CString::from_raw(result.body) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn act_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const MAP: &str = r#"{"app-1":"http://10.0.0.5:8001"}"#;

    #[derive(Default)]
    struct Seen {
        calls: usize,
        error: Option<String>,
        body: Option<String>,
        status: Option<u16>,
    }

    fn owned(ptr: *const c_char) -> Option<String> {
        borrow_str(ptr).map(str::to_string)
    }

    extern "C" fn record(
        error: *const c_char,
        body: *const c_char,
        response: *const FfiHttpResponse,
        user_data: *mut c_void,
    ) {
        let seen = unsafe { &mut *(user_data as *mut Seen) };
        seen.calls += 1;
        seen.error = owned(error);
        seen.body = owned(body);
        seen.status = (!response.is_null()).then(|| unsafe { (*response).status });
    }

    fn dispatcher() -> *mut FfiDispatcher {
        let widget = CString::new("caller-app").unwrap();
        let map = CString::new(MAP).unwrap();
        act_dispatcher_new(widget.as_ptr(), map.as_ptr())
    }

    fn call(dispatcher: *const FfiDispatcher, params: &str) -> (FfiCallStatus, Seen) {
        let params = CString::new(params).unwrap();
        let mut seen = Seen::default();
        let status = act_call(
            dispatcher,
            params.as_ptr(),
            Some(record),
            &mut seen as *mut Seen as *mut c_void,
        );
        (status, seen)
    }

    #[test]
    fn dispatcher_new_and_free() {
        let d = dispatcher();
        assert!(!d.is_null());
        act_dispatcher_free(d);
    }

    #[test]
    fn dispatcher_new_null_widget_returns_null() {
        assert!(act_dispatcher_new(std::ptr::null(), std::ptr::null()).is_null());
    }

    #[test]
    fn dispatcher_new_invalid_widget_returns_null() {
        let widget = CString::new("bad\rwidget").unwrap();
        assert!(act_dispatcher_new(widget.as_ptr(), std::ptr::null()).is_null());
    }

    #[test]
    fn dispatcher_free_null_is_safe() {
        act_dispatcher_free(std::ptr::null_mut());
    }

    #[test]
    fn call_without_callback_is_rejected() {
        let d = dispatcher();
        let params = CString::new(r#"{"guid":"app-1","endpoint":"x"}"#).unwrap();
        let status = act_call(d, params.as_ptr(), None, std::ptr::null_mut());
        assert_eq!(status, FfiCallStatus::InvalidCallback);
        act_dispatcher_free(d);
    }

    #[test]
    fn call_with_null_dispatcher_skips_callback() {
        let (status, seen) = call(std::ptr::null(), "{}");
        assert_eq!(status, FfiCallStatus::NullArg);
        assert_eq!(seen.calls, 0);
    }

    #[test]
    fn validation_error_goes_through_callback() {
        let d = dispatcher();
        let (status, seen) = call(d, r#"{"endpoint":"x"}"#);
        assert_eq!(status, FfiCallStatus::Ok);
        assert_eq!(seen.calls, 1);
        assert_eq!(seen.error.as_deref(), Some("The param guid is missing"));
        assert!(seen.body.is_none());
        assert!(seen.status.is_none());
        act_dispatcher_free(d);
    }

    #[test]
    fn unparseable_params_are_missing_params() {
        let d = dispatcher();
        let (_, seen) = call(d, "{not json");
        assert_eq!(seen.calls, 1);
        assert_eq!(seen.error.as_deref(), Some("params is missing"));
        act_dispatcher_free(d);
    }

    #[test]
    fn unknown_guid_goes_through_callback() {
        let d = dispatcher();
        let (_, seen) = call(d, r#"{"guid":"app-2","endpoint":"x"}"#);
        assert_eq!(seen.calls, 1);
        assert!(seen.error.unwrap().contains("app-2"));
        act_dispatcher_free(d);
    }

    #[test]
    fn dispatch_reports_resolution_errors() {
        let d = dispatcher();
        let params = CString::new(r#"{"guid":"app-2","endpoint":"x"}"#).unwrap();
        let result = act_dispatch(d, params.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Resolution);
        assert!(!r.error_message.is_null());
        assert!(r.body.is_null());
        act_free_result(result);
        act_dispatcher_free(d);
    }

    #[test]
    fn dispatch_null_dispatcher_returns_null_arg() {
        let result = act_dispatch(std::ptr::null(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        act_free_result(result);
    }

    #[test]
    fn build_request_produces_post_with_json_body() {
        let d = dispatcher();
        let params = CString::new(r#"{"guid":"app-1","endpoint":"sum","params":{"a":1}}"#).unwrap();
        let req = act_build_request(d, params.as_ptr(), std::ptr::null_mut());
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(borrow_str(r.method), Some("POST"));
        assert_eq!(borrow_str(r.url), Some("http://10.0.0.5:8001/cloud/sum"));
        assert_eq!(borrow_str(r.body), Some(r#"{"a":1}"#));
        assert_eq!(r.timeout_ms, 60_000);
        assert!(r.json);

        let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) };
        let identity = headers
            .iter()
            .find(|h| borrow_str(h.key) == Some("x-request-with"))
            .unwrap();
        assert_eq!(borrow_str(identity.value), Some("caller-app"));

        act_free_request(req);
        act_dispatcher_free(d);
    }

    #[test]
    fn build_request_get_has_query_and_no_body() {
        let d = dispatcher();
        let params =
            CString::new(r#"{"guid":"app-1","endpoint":"find","method":"GET","params":{"a":1}}"#).unwrap();
        let req = act_build_request(d, params.as_ptr(), std::ptr::null_mut());
        let r = unsafe { &*req };
        assert_eq!(borrow_str(r.url), Some("http://10.0.0.5:8001/cloud/find?a=1"));
        assert!(r.body.is_null());
        act_free_request(req);
        act_dispatcher_free(d);
    }

    #[test]
    fn build_request_failure_sets_out_error() {
        let d = dispatcher();
        let params = CString::new(r#"{"guid":"app-1"}"#).unwrap();
        let mut message: *mut c_char = std::ptr::null_mut();
        let req = act_build_request(d, params.as_ptr(), &mut message);
        assert!(req.is_null());
        assert_eq!(borrow_str(message), Some("Either \"path\" or \"endpoint\" is required."));
        act_free_string(message);
        act_dispatcher_free(d);
    }

    #[test]
    fn parse_response_decodes_json_body() {
        let body = CString::new(r#"{ "sum": 3 }"#).unwrap();
        let result = act_parse_response(201, body.as_ptr(), true);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.http_status, 201);
        assert_eq!(borrow_str(r.body), Some(r#"{"sum":3}"#));
        act_free_result(result);
    }

    #[test]
    fn parse_response_keeps_text_when_json_is_off() {
        let body = CString::new(r#"{ "sum": 3 }"#).unwrap();
        let result = act_parse_response(200, body.as_ptr(), false);
        assert_eq!(borrow_str(unsafe { &*result }.body), Some(r#"{ "sum": 3 }"#));
        act_free_result(result);
    }

    #[test]
    fn parse_response_null_body_is_empty() {
        let result = act_parse_response(204, std::ptr::null(), true);
        let r = unsafe { &*result };
        assert_eq!(r.http_status, 204);
        assert_eq!(borrow_str(r.body), Some(""));
        act_free_result(result);
    }

    #[test]
    fn interior_nul_is_dropped() {
        assert_eq!(c_string("a\0b".to_string()).to_str().unwrap(), "ab");
    }

    #[test]
    fn free_request_null_is_safe() {
        act_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        act_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        act_free_string(std::ptr::null_mut());
    }
}
