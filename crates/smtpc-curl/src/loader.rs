//! Resolution of the libcurl function table.
//!
//! libcurl is looked up in the host process first. If the host does not
//! carry a usable copy, a shared library is opened with deep binding so its
//! relocations never resolve into same-named symbols the host exports.

use std::ffi::CStr;
use std::fmt;

use libc::c_int;
use libloading::os::unix::Library;
use smtpc::{Error, Result, Version};
use tracing::{debug, error, warn};

use crate::sys::{
    CURLVERSION_FOURTH, EasyCleanup, EasyGetinfo, EasyInit, EasyPerform, EasySetopt, EasyStrerror,
    SlistAppend, SlistFreeAll, VersionInfo,
};

#[cfg(target_vendor = "apple")]
const LIBRARY_NAMES: &[&str] = &["libcurl.dylib"];
#[cfg(not(target_vendor = "apple"))]
const LIBRARY_NAMES: &[&str] = &["libcurl.so", "libcurl.so.4"];

#[cfg(all(target_os = "linux", target_env = "gnu"))]
const DEEPBIND: c_int = libc::RTLD_DEEPBIND;
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
const DEEPBIND: c_int = 0;

/// Protocols the SMTP client cannot work without.
const REQUIRED_PROTOCOLS: [&str; 2] = ["smtps", "smtp"];

/// Where the function table was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Symbols already linked into the host process.
    Process,
    /// A shared library opened by the loader.
    Shared(&'static str),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => f.write_str("host process"),
            Self::Shared(name) => f.write_str(name),
        }
    }
}

/// Resolved libcurl entry points.
///
/// The library handle is kept alongside the pointers; they stay valid for
/// as long as this value lives.
pub(crate) struct Api {
    pub easy_init: EasyInit,
    pub easy_setopt: EasySetopt,
    pub easy_perform: EasyPerform,
    pub easy_getinfo: EasyGetinfo,
    pub easy_cleanup: EasyCleanup,
    pub easy_strerror: EasyStrerror,
    pub slist_append: SlistAppend,
    pub slist_free_all: SlistFreeAll,
    pub version: Version,
    pub origin: Origin,
    _library: Library,
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("version", &self.version)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Api {
    /// Resolves libcurl, preferring the copy already in the process.
    pub(crate) fn load() -> Result<Self> {
        match Self::resolve(Library::this(), Origin::Process) {
            Ok(api) => return Ok(api),
            Err(err) => warn!(
                error = %err,
                "libcurl is not usable from the host process, loading shared library"
            ),
        }

        Self::open_shared()
            .and_then(|(library, name)| Self::resolve(library, Origin::Shared(name)))
            .inspect_err(|err| error!(error = %err, "failed to initialize libcurl"))
    }

    fn open_shared() -> Result<(Library, &'static str)> {
        let flags = libc::RTLD_NOW | libc::RTLD_LOCAL | DEEPBIND;
        let mut last = Error::Load {
            library: "libcurl",
            reason: "no candidate library names".to_string(),
        };

        for &name in LIBRARY_NAMES {
            // SAFETY: libcurl has no load-time initializers with preconditions.
            match unsafe { Library::open(Some(name), flags) } {
                Ok(library) => {
                    debug!(library = name, "opened shared libcurl");
                    return Ok((library, name));
                }
                Err(err) => {
                    debug!(library = name, error = %err, "could not open shared libcurl");
                    last = Error::Load {
                        library: name,
                        reason: err.to_string(),
                    };
                }
            }
        }
        Err(last)
    }

    fn resolve(library: Library, origin: Origin) -> Result<Self> {
        let version_info: VersionInfo = symbol(&library, "curl_version_info")?;
        // SAFETY: the pointer was resolved from libcurl under the name of a
        // function with this signature.
        let version = unsafe { probe(version_info) }?;

        Ok(Self {
            easy_init: symbol(&library, "curl_easy_init")?,
            easy_setopt: symbol(&library, "curl_easy_setopt")?,
            easy_perform: symbol(&library, "curl_easy_perform")?,
            easy_getinfo: symbol(&library, "curl_easy_getinfo")?,
            easy_cleanup: symbol(&library, "curl_easy_cleanup")?,
            easy_strerror: symbol(&library, "curl_easy_strerror")?,
            slist_append: symbol(&library, "curl_slist_append")?,
            slist_free_all: symbol(&library, "curl_slist_free_all")?,
            version,
            origin,
            _library: library,
        })
    }
}

/// Looks up one function pointer by name.
fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T> {
    // SAFETY: every call site names a libcurl function whose C signature
    // matches `T`.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|symbol| *symbol)
        .map_err(|err| Error::MissingSymbol {
            symbol: name,
            reason: err.to_string(),
        })
}

/// Reads the library version and checks the compiled-in protocols.
///
/// # Safety
///
/// `version_info` must behave like `curl_version_info`: it returns either
/// NULL or a pointer to data that outlives the call, whose `protocols` list
/// is NULL-terminated.
pub(crate) unsafe fn probe(version_info: VersionInfo) -> Result<Version> {
    // SAFETY: guaranteed by the caller.
    let info = unsafe { version_info(CURLVERSION_FOURTH).as_ref() };
    let Some(info) = info else {
        return Err(Error::MissingSymbol {
            symbol: "curl_version_info",
            reason: "returned no version data".to_string(),
        });
    };

    let mut protocols = Vec::new();
    let mut cursor = info.protocols;
    // SAFETY: the list is NULL-terminated and each entry is a C string.
    unsafe {
        while !cursor.is_null() && !(*cursor).is_null() {
            protocols.push(CStr::from_ptr(*cursor).to_string_lossy());
            cursor = cursor.add(1);
        }
    }

    for required in REQUIRED_PROTOCOLS {
        if !protocols.iter().any(|protocol| protocol == required) {
            return Err(Error::MissingProtocol(required));
        }
    }

    Ok(Version::from_packed(info.version_num))
}
