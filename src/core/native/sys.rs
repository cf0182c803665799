// Raw signatures of the libhybris and bionic entry points resolved at bind time.
use std::os::raw::{c_char, c_int, c_uint, c_void};

pub const ANDROID_DLOPEN: &str = "android_dlopen";
pub const ANDROID_DLSYM: &str = "android_dlsym";
pub const ANDROID_DLCLOSE: &str = "android_dlclose";
pub const SYSTEM_PROPERTY_WAIT_ANY: &str = "__system_property_wait_any";
pub const PROPERTY_LIST: &str = "property_list";

pub type AndroidDlopenFn = unsafe extern "C" fn(filename: *const c_char, flag: c_int) -> *mut c_void;

pub type AndroidDlsymFn =
    unsafe extern "C" fn(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;

pub type AndroidDlcloseFn = unsafe extern "C" fn(handle: *mut c_void) -> c_int;

pub type SystemPropertyWaitAnyFn = unsafe extern "C" fn(old_serial: c_uint) -> c_uint;

pub type PropertyVisitorFn =
    unsafe extern "C" fn(key: *const c_char, value: *const c_char, cookie: *mut c_void);

pub type PropertyListFn =
    unsafe extern "C" fn(visit: PropertyVisitorFn, cookie: *mut c_void) -> c_int;
