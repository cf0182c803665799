//! Purpose: Bind the wait loop to Android properties through libhybris.
//! Exports: `NativeBackend`, `NativeLibraries`.
//! Role: Production `PropertyBackend`; change notification comes from bionic, enumeration from libhybris.
//! Invariants: Every library and symbol is resolved at runtime; the crate never links against them.
//! Invariants: Any missing library or symbol is `ErrorKind::Unavailable` and is never retried.
//! Invariants: Handles are released exactly once, when the backend is dropped.

#[cfg(unix)]
mod sys;

use tracing::debug;

#[cfg(unix)]
use std::ffi::{CStr, CString};
#[cfg(unix)]
use std::os::raw::{c_char, c_void};

use crate::core::backend::PropertyBackend;
use crate::core::error::{Error, ErrorKind};
#[cfg(unix)]
use crate::core::property::Property;
use crate::core::property::PropertySnapshot;

pub const DEFAULT_HYBRIS_LIB: &str = "libhybris-common.so.1";
pub const DEFAULT_PROPERTIES_LIB: &str = "libandroid-properties.so.1";
pub const DEFAULT_BIONIC_LIBC: &str = "libc.so";

/// Library names the binding loads.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NativeLibraries {
    /// Host library exporting `android_dlopen` and friends.
    pub hybris: String,
    /// Host library exporting `property_list`.
    pub properties: String,
    /// Bionic libc, opened through the Android linker.
    pub bionic_libc: String,
}

impl Default for NativeLibraries {
    fn default() -> Self {
        Self {
            hybris: DEFAULT_HYBRIS_LIB.to_string(),
            properties: DEFAULT_PROPERTIES_LIB.to_string(),
            bionic_libc: DEFAULT_BIONIC_LIBC.to_string(),
        }
    }
}

fn unavailable(message: String) -> Error {
    Error::new(ErrorKind::Unavailable)
        .with_message(message)
        .with_hint("Is libhybris installed and the Android container running?")
}

#[cfg(unix)]
struct HostLibrary {
    name: String,
    handle: *mut c_void,
}

#[cfg(unix)]
impl HostLibrary {
    fn open(name: &str) -> Result<Self, Error> {
        let c_name = c_string(name)?;
        let handle = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_LAZY) };
        if handle.is_null() {
            return Err(unavailable(with_dl_error(format!("failed to load {name}"))).with_path(name));
        }
        debug!(library = name, "loaded host library");
        Ok(Self {
            name: name.to_string(),
            handle,
        })
    }

    fn symbol(&self, symbol: &str) -> Result<*mut c_void, Error> {
        let c_symbol = c_string(symbol)?;
        unsafe {
            libc::dlerror();
        }
        let ptr = unsafe { libc::dlsym(self.handle, c_symbol.as_ptr()) };
        if ptr.is_null() {
            return Err(unavailable(with_dl_error(format!(
                "failed to resolve {symbol} from {}",
                self.name
            )))
            .with_path(&self.name));
        }
        Ok(ptr)
    }
}

#[cfg(unix)]
impl Drop for HostLibrary {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

// A library opened through the Android linker; must be closed through it as well.
#[cfg(unix)]
struct BionicLibrary {
    handle: *mut c_void,
    close: sys::AndroidDlcloseFn,
}

#[cfg(unix)]
impl Drop for BionicLibrary {
    fn drop(&mut self) {
        unsafe {
            (self.close)(self.handle);
        }
    }
}

#[cfg(unix)]
pub struct NativeBackend {
    wait_any: sys::SystemPropertyWaitAnyFn,
    property_list: sys::PropertyListFn,
    // Declaration order is drop order: bionic goes before the host libraries backing it.
    _bionic: BionicLibrary,
    _properties: HostLibrary,
    _hybris: HostLibrary,
}

#[cfg(unix)]
impl NativeBackend {
    pub fn bind(libraries: &NativeLibraries) -> Result<Self, Error> {
        let hybris = HostLibrary::open(&libraries.hybris)?;
        let android_dlopen = unsafe {
            std::mem::transmute::<*mut c_void, sys::AndroidDlopenFn>(
                hybris.symbol(sys::ANDROID_DLOPEN)?,
            )
        };
        let android_dlsym = unsafe {
            std::mem::transmute::<*mut c_void, sys::AndroidDlsymFn>(
                hybris.symbol(sys::ANDROID_DLSYM)?,
            )
        };
        let android_dlclose = unsafe {
            std::mem::transmute::<*mut c_void, sys::AndroidDlcloseFn>(
                hybris.symbol(sys::ANDROID_DLCLOSE)?,
            )
        };

        let properties = HostLibrary::open(&libraries.properties)?;
        let property_list = unsafe {
            std::mem::transmute::<*mut c_void, sys::PropertyListFn>(
                properties.symbol(sys::PROPERTY_LIST)?,
            )
        };

        let c_libc = c_string(&libraries.bionic_libc)?;
        let handle = unsafe { android_dlopen(c_libc.as_ptr(), libc::RTLD_LAZY) };
        if handle.is_null() {
            return Err(unavailable(format!(
                "failed to load bionic {}",
                libraries.bionic_libc
            ))
            .with_path(&libraries.bionic_libc));
        }
        let bionic = BionicLibrary {
            handle,
            close: android_dlclose,
        };
        debug!(library = %libraries.bionic_libc, "loaded bionic library");

        let c_wait_any = c_string(sys::SYSTEM_PROPERTY_WAIT_ANY)?;
        let wait_any = unsafe { android_dlsym(bionic.handle, c_wait_any.as_ptr()) };
        if wait_any.is_null() {
            return Err(unavailable(format!(
                "failed to load {} from bionic {}",
                sys::SYSTEM_PROPERTY_WAIT_ANY,
                libraries.bionic_libc
            ))
            .with_path(&libraries.bionic_libc));
        }
        let wait_any =
            unsafe { std::mem::transmute::<*mut c_void, sys::SystemPropertyWaitAnyFn>(wait_any) };

        Ok(Self {
            wait_any,
            property_list,
            _bionic: bionic,
            _properties: properties,
            _hybris: hybris,
        })
    }
}

#[cfg(unix)]
impl PropertyBackend for NativeBackend {
    fn wait_for_change(&self, serial: u32) -> Result<u32, Error> {
        Ok(unsafe { (self.wait_any)(serial) })
    }

    fn snapshot(&self) -> Result<PropertySnapshot, Error> {
        let mut entries: Vec<Property> = Vec::new();
        let cookie = (&mut entries as *mut Vec<Property>).cast::<c_void>();
        let rc = unsafe { (self.property_list)(collect_property, cookie) };
        if rc < 0 {
            return Err(Error::new(ErrorKind::Unavailable)
                .with_message(format!("{} failed (rc={rc})", sys::PROPERTY_LIST)));
        }
        Ok(PropertySnapshot::new(entries))
    }
}

#[cfg(unix)]
unsafe extern "C" fn collect_property(key: *const c_char, value: *const c_char, cookie: *mut c_void) {
    if key.is_null() || value.is_null() || cookie.is_null() {
        return;
    }
    // SAFETY: cookie is the Vec handed to `property_list` by `snapshot`, live for the whole call.
    let entries = unsafe { &mut *cookie.cast::<Vec<Property>>() };
    let key = unsafe { CStr::from_ptr(key) }.to_string_lossy().into_owned();
    let value = unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned();
    entries.push(Property { key, value });
}

#[cfg(unix)]
fn c_string(value: &str) -> Result<CString, Error> {
    CString::new(value).map_err(|err| {
        Error::new(ErrorKind::Unavailable)
            .with_message(format!("name contains an interior NUL: {value:?}"))
            .with_source(err)
    })
}

#[cfg(unix)]
fn with_dl_error(message: String) -> String {
    let err = unsafe { libc::dlerror() };
    if err.is_null() {
        return message;
    }
    let detail = unsafe { CStr::from_ptr(err) }.to_string_lossy();
    format!("{message}: {detail}")
}

#[cfg(not(unix))]
pub struct NativeBackend {
    _private: (),
}

#[cfg(not(unix))]
impl NativeBackend {
    pub fn bind(libraries: &NativeLibraries) -> Result<Self, Error> {
        debug!(library = %libraries.hybris, "native binding unsupported on this platform");
        Err(unavailable(format!(
            "cannot load {} on this platform",
            libraries.hybris
        )))
    }
}

#[cfg(not(unix))]
impl PropertyBackend for NativeBackend {
    fn wait_for_change(&self, _serial: u32) -> Result<u32, Error> {
        Err(Error::new(ErrorKind::Unavailable))
    }

    fn snapshot(&self) -> Result<PropertySnapshot, Error> {
        Err(Error::new(ErrorKind::Unavailable))
    }
}
