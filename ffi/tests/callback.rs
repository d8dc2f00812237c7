//! Drive `act_call` end to end against the live mock target app, the way a
//! C host would: JSON in, C callback out.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use act_ffi::types::{FfiCallStatus, FfiErrorCode, FfiHttpResponse};
use act_ffi::{act_call, act_dispatch, act_dispatcher_free, act_dispatcher_new, act_free_result};

#[derive(Default)]
struct Seen {
    calls: usize,
    error: Option<String>,
    body: Option<String>,
    status: Option<u16>,
    raw_body: Option<String>,
}

fn owned(ptr: *const c_char) -> Option<String> {
    (!ptr.is_null()).then(|| unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
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
    if !response.is_null() {
        let response = unsafe { &*response };
        seen.status = Some(response.status);
        seen.raw_body = owned(response.body);
    }
}

fn start_target() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

#[test]
fn callback_receives_error_body_response_in_order() {
    let addr = start_target();
    let widget = CString::new("caller-app").unwrap();
    let map = CString::new(format!(r#"{{"target-app":"http://{addr}"}}"#)).unwrap();
    let dispatcher = act_dispatcher_new(widget.as_ptr(), map.as_ptr());
    assert!(!dispatcher.is_null());

    // Step 1: successful call, body and response both delivered.
    let params = CString::new(r#"{"guid":"target-app","endpoint":"sum","params":{"a":1}}"#).unwrap();
    let mut seen = Seen::default();
    let status = act_call(dispatcher, params.as_ptr(), Some(record), &mut seen as *mut Seen as *mut c_void);
    assert_eq!(status, FfiCallStatus::Ok);
    assert_eq!(seen.calls, 1);
    assert!(seen.error.is_none());
    assert_eq!(seen.status, Some(200));
    let echo: serde_json::Value = serde_json::from_str(seen.body.as_deref().unwrap()).unwrap();
    assert_eq!(echo["body"], serde_json::json!({"a": 1}));
    assert_eq!(echo["headers"]["x-request-with"], "caller-app");
    assert!(seen.raw_body.is_some());

    // Step 2: server error is data, not an error.
    let params = CString::new(r#"{"guid":"target-app","endpoint":"fail"}"#).unwrap();
    let mut seen = Seen::default();
    act_call(dispatcher, params.as_ptr(), Some(record), &mut seen as *mut Seen as *mut c_void);
    assert_eq!(seen.calls, 1);
    assert!(seen.error.is_none());
    assert_eq!(seen.status, Some(500));

    // Step 3: the same call through the result envelope.
    let result = act_dispatch(dispatcher, params.as_ptr());
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    assert_eq!(r.http_status, 500);
    act_free_result(result);

    // Step 4: transport failure lands in the error slot only.
    let params = CString::new(r#"{"guid":"target-app","endpoint":"slow","timeout":50}"#).unwrap();
    let mut seen = Seen::default();
    act_call(dispatcher, params.as_ptr(), Some(record), &mut seen as *mut Seen as *mut c_void);
    assert_eq!(seen.calls, 1);
    assert!(seen.error.is_some());
    assert!(seen.body.is_none());
    assert!(seen.status.is_none());

    act_dispatcher_free(dispatcher);
}
