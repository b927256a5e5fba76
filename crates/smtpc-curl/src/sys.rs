//! Raw libcurl declarations.
//!
//! Only the subset of `curl/curl.h` the SMTP session touches. Values are
//! part of libcurl's stable ABI.

#![allow(non_camel_case_types, dead_code)]

use libc::{c_char, c_int, c_long, c_uint, c_void, size_t};

/// Opaque easy handle.
pub enum CURL {}

/// `struct curl_slist`.
#[repr(C)]
pub struct curl_slist {
    pub data: *mut c_char,
    pub next: *mut curl_slist,
}

pub type CURLcode = c_int;
pub type CURLoption = c_int;
pub type CURLINFO = c_int;
pub type CURLversion = c_int;

pub const CURLE_OK: CURLcode = 0;
pub const CURLE_OUT_OF_MEMORY: CURLcode = 27;

const CURLOPTTYPE_LONG: CURLoption = 0;
const CURLOPTTYPE_OBJECTPOINT: CURLoption = 10_000;
const CURLOPTTYPE_FUNCTIONPOINT: CURLoption = 20_000;

pub const CURLOPT_READDATA: CURLoption = CURLOPTTYPE_OBJECTPOINT + 9;
pub const CURLOPT_URL: CURLoption = CURLOPTTYPE_OBJECTPOINT + 2;
pub const CURLOPT_ERRORBUFFER: CURLoption = CURLOPTTYPE_OBJECTPOINT + 10;
pub const CURLOPT_TIMEOUT: CURLoption = CURLOPTTYPE_LONG + 13;
pub const CURLOPT_SSLCERT: CURLoption = CURLOPTTYPE_OBJECTPOINT + 25;
pub const CURLOPT_VERBOSE: CURLoption = CURLOPTTYPE_LONG + 41;
pub const CURLOPT_UPLOAD: CURLoption = CURLOPTTYPE_LONG + 46;
pub const CURLOPT_SSL_VERIFYPEER: CURLoption = CURLOPTTYPE_LONG + 64;
pub const CURLOPT_CAINFO: CURLoption = CURLOPTTYPE_OBJECTPOINT + 65;
pub const CURLOPT_SSL_VERIFYHOST: CURLoption = CURLOPTTYPE_LONG + 81;
pub const CURLOPT_SSLKEY: CURLoption = CURLOPTTYPE_OBJECTPOINT + 87;
pub const CURLOPT_CAPATH: CURLoption = CURLOPTTYPE_OBJECTPOINT + 97;
pub const CURLOPT_NOSIGNAL: CURLoption = CURLOPTTYPE_LONG + 99;
pub const CURLOPT_USE_SSL: CURLoption = CURLOPTTYPE_LONG + 119;
pub const CURLOPT_USERNAME: CURLoption = CURLOPTTYPE_OBJECTPOINT + 173;
pub const CURLOPT_PASSWORD: CURLoption = CURLOPTTYPE_OBJECTPOINT + 174;
pub const CURLOPT_MAIL_FROM: CURLoption = CURLOPTTYPE_OBJECTPOINT + 186;
pub const CURLOPT_MAIL_RCPT: CURLoption = CURLOPTTYPE_OBJECTPOINT + 187;
pub const CURLOPT_READFUNCTION: CURLoption = CURLOPTTYPE_FUNCTIONPOINT + 12;

const CURLINFO_LONG: CURLINFO = 0x20_0000;

pub const CURLINFO_RESPONSE_CODE: CURLINFO = CURLINFO_LONG + 2;
pub const CURLINFO_OS_ERRNO: CURLINFO = CURLINFO_LONG + 25;

/// First layout carrying the `protocols` list (libcurl 7.16.1+).
pub const CURLVERSION_FOURTH: CURLversion = 3;

/// Returned from the read callback to abort the transfer.
pub const CURL_READFUNC_ABORT: size_t = 0x1000_0000;

/// Leading fields of `curl_version_info_data`, stable across every age.
#[repr(C)]
pub struct curl_version_info_data {
    pub age: CURLversion,
    pub version: *const c_char,
    pub version_num: c_uint,
    pub host: *const c_char,
    pub features: c_int,
    pub ssl_version: *const c_char,
    pub ssl_version_num: c_long,
    pub libz_version: *const c_char,
    /// NULL-terminated list of protocol names.
    pub protocols: *const *const c_char,
}

pub type ReadCallback =
    extern "C" fn(buffer: *mut c_char, size: size_t, nitems: size_t, userdata: *mut c_void) -> size_t;

pub type EasyInit = unsafe extern "C" fn() -> *mut CURL;
pub type EasySetopt = unsafe extern "C" fn(*mut CURL, CURLoption, ...) -> CURLcode;
pub type EasyPerform = unsafe extern "C" fn(*mut CURL) -> CURLcode;
pub type EasyGetinfo = unsafe extern "C" fn(*mut CURL, CURLINFO, ...) -> CURLcode;
pub type EasyCleanup = unsafe extern "C" fn(*mut CURL);
pub type EasyStrerror = unsafe extern "C" fn(CURLcode) -> *const c_char;
pub type SlistAppend = unsafe extern "C" fn(*mut curl_slist, *const c_char) -> *mut curl_slist;
pub type SlistFreeAll = unsafe extern "C" fn(*mut curl_slist);
pub type VersionInfo = unsafe extern "C" fn(CURLversion) -> *mut curl_version_info_data;
