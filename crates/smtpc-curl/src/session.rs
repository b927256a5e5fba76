//! One libcurl easy handle driving one SMTP transaction.

use std::ffi::CString;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use libc::{c_char, c_long, c_void, size_t};
use smtpc::{Body, Error, Result, Session, SessionOption, Submission, TransportCode};
use tracing::{trace, warn};

use crate::loader::Api;
use crate::sys::{
    CURL, CURL_READFUNC_ABORT, CURLE_OK, CURLE_OUT_OF_MEMORY, CURLINFO, CURLINFO_OS_ERRNO,
    CURLINFO_RESPONSE_CODE, CURLOPT_CAINFO, CURLOPT_CAPATH, CURLOPT_ERRORBUFFER,
    CURLOPT_MAIL_FROM, CURLOPT_MAIL_RCPT, CURLOPT_NOSIGNAL, CURLOPT_PASSWORD, CURLOPT_READDATA,
    CURLOPT_READFUNCTION, CURLOPT_SSL_VERIFYHOST, CURLOPT_SSL_VERIFYPEER, CURLOPT_SSLCERT,
    CURLOPT_SSLKEY, CURLOPT_TIMEOUT, CURLOPT_UPLOAD, CURLOPT_URL, CURLOPT_USE_SSL,
    CURLOPT_USERNAME, CURLOPT_VERBOSE, CURLcode, CURLoption, ReadCallback, curl_slist,
};

/// An owned easy handle.
pub(crate) struct CurlSession {
    api: Arc<Api>,
    easy: NonNull<CURL>,
}

// SAFETY: an easy handle may move between threads as long as it is used by
// one thread at a time, which `&mut self` on every mutating call enforces.
unsafe impl Send for CurlSession {}

impl CurlSession {
    /// Creates a handle with signal-based timeouts disabled.
    pub(crate) fn open(api: Arc<Api>) -> Result<Self> {
        // SAFETY: curl_easy_init has no preconditions.
        let easy = unsafe { (api.easy_init)() };
        let easy = NonNull::new(easy).ok_or(Error::Alloc("transport handle"))?;
        let session = Self { api, easy };
        session.set_long(CURLOPT_NOSIGNAL, "nosignal", 1)?;
        Ok(session)
    }

    fn set_long(&self, option: CURLoption, name: &'static str, value: c_long) -> Result<()> {
        // SAFETY: `option` takes a long argument.
        let code = unsafe { (self.api.easy_setopt)(self.easy.as_ptr(), option, value) };
        self.check(code, name)
    }

    fn set_str(&self, option: CURLoption, name: &'static str, value: &str) -> Result<()> {
        let value = CString::new(value)
            .map_err(|_| Error::Config(format!("{name} must not contain NUL bytes")))?;
        // SAFETY: `option` takes a string argument; libcurl copies it.
        let code = unsafe { (self.api.easy_setopt)(self.easy.as_ptr(), option, value.as_ptr()) };
        self.check(code, name)
    }

    fn check(&self, code: CURLcode, name: &'static str) -> Result<()> {
        match code {
            CURLE_OK => Ok(()),
            CURLE_OUT_OF_MEMORY => Err(Error::Alloc("transport option")),
            _ => Err(Error::Config(format!(
                "transport rejected {name}: {}",
                strerror(&self.api, code)
            ))),
        }
    }

    fn getinfo_long(&self, info: CURLINFO) -> c_long {
        let mut value: c_long = 0;
        // SAFETY: `info` is a long-valued field and `value` outlives the call.
        unsafe { (self.api.easy_getinfo)(self.easy.as_ptr(), info, &raw mut value) };
        value
    }
}

impl Session for CurlSession {
    fn set_option(&mut self, option: SessionOption<'_>) -> Result<()> {
        let name = option.name();
        match option {
            SessionOption::Url(url) => self.set_str(CURLOPT_URL, name, url),
            SessionOption::MailFrom(from) => self.set_str(CURLOPT_MAIL_FROM, name, from),
            SessionOption::Verbose(on) => self.set_long(CURLOPT_VERBOSE, name, c_long::from(on)),
            SessionOption::CaPath(path) => self.set_str(CURLOPT_CAPATH, name, path),
            SessionOption::CaFile(path) => self.set_str(CURLOPT_CAINFO, name, path),
            SessionOption::VerifyHost(on) => {
                self.set_long(CURLOPT_SSL_VERIFYHOST, name, if on { 2 } else { 0 })
            }
            SessionOption::VerifyPeer(on) => {
                self.set_long(CURLOPT_SSL_VERIFYPEER, name, c_long::from(on))
            }
            SessionOption::ClientKey(path) => self.set_str(CURLOPT_SSLKEY, name, path),
            SessionOption::ClientCert(path) => self.set_str(CURLOPT_SSLCERT, name, path),
            SessionOption::UseSsl(level) => {
                self.set_long(CURLOPT_USE_SSL, name, c_long::from(level.as_u8()))
            }
            SessionOption::Username(user) => self.set_str(CURLOPT_USERNAME, name, user),
            SessionOption::Password(pass) => self.set_str(CURLOPT_PASSWORD, name, pass),
        }
    }

    fn perform(&mut self, submission: &mut Submission<'_>) -> TransportCode {
        let recipients = match Recipients::build(&self.api, submission.recipients) {
            Ok(list) => list,
            Err(code) => return code,
        };

        let easy = self.easy.as_ptr();
        let setopt = self.api.easy_setopt;
        let body: *mut Body = &raw mut *submission.body;
        let errors = submission.errors.as_mut_bytes().as_mut_ptr().cast::<c_char>();
        let timeout = c_long::try_from(submission.timeout.as_secs()).unwrap_or(c_long::MAX);
        let upload: c_long = 1;

        trace!(timeout_secs = timeout, "performing SMTP transfer");
        // SAFETY (setup blocks): every pointer handed to libcurl outlives
        // the perform call and is cleared again before this function returns.
        let mut read_function =
            || unsafe { setopt(easy, CURLOPT_READFUNCTION, read_body as ReadCallback) };
        let mut read_data = || unsafe { setopt(easy, CURLOPT_READDATA, body.cast::<c_void>()) };
        let mut mail_rcpt = || unsafe { setopt(easy, CURLOPT_MAIL_RCPT, recipients.head) };
        let mut setup: [&mut dyn FnMut() -> CURLcode; 3] =
            [&mut read_function, &mut read_data, &mut mail_rcpt];

        let mut code = first_failure(&mut setup);
        if code == CURLE_OK {
            // SAFETY: as above; the error buffer is cleared below as well.
            code = unsafe {
                setopt(easy, CURLOPT_UPLOAD, upload);
                setopt(easy, CURLOPT_TIMEOUT, timeout);
                setopt(easy, CURLOPT_ERRORBUFFER, errors);
                (self.api.easy_perform)(easy)
            };
        } else {
            warn!(code, "libcurl rejected the SMTP transfer setup");
        }

        // SAFETY: resetting these options to null is always valid.
        unsafe {
            setopt(easy, CURLOPT_ERRORBUFFER, ptr::null_mut::<c_char>());
            setopt(easy, CURLOPT_READDATA, ptr::null_mut::<c_void>());
            setopt(easy, CURLOPT_MAIL_RCPT, ptr::null_mut::<curl_slist>());
        }
        TransportCode::new(code)
    }

    fn response_code(&self) -> i64 {
        i64::from(self.getinfo_long(CURLINFO_RESPONSE_CODE))
    }

    fn os_errno(&self) -> i32 {
        i32::try_from(self.getinfo_long(CURLINFO_OS_ERRNO)).unwrap_or(0)
    }
}

impl Drop for CurlSession {
    fn drop(&mut self) {
        // SAFETY: the handle is valid and never used again.
        unsafe { (self.api.easy_cleanup)(self.easy.as_ptr()) };
    }
}

/// Runs `steps` in order and returns the first code other than `CURLE_OK`.
fn first_failure(steps: &mut [&mut dyn FnMut() -> CURLcode]) -> CURLcode {
    for step in steps {
        let code = step();
        if code != CURLE_OK {
            return code;
        }
    }
    CURLE_OK
}

/// Returns libcurl's description of `code`.
pub(crate) fn strerror(api: &Api, code: CURLcode) -> String {
    // SAFETY: curl_easy_strerror returns a static string for any code.
    let text = unsafe { (api.easy_strerror)(code) };
    if text.is_null() {
        return String::new();
    }
    // SAFETY: non-null results are NUL-terminated.
    unsafe { std::ffi::CStr::from_ptr(text) }
        .to_string_lossy()
        .into_owned()
}

/// Recipient list in libcurl's linked-list form, freed on drop.
struct Recipients<'a> {
    api: &'a Api,
    head: *mut curl_slist,
}

impl<'a> Recipients<'a> {
    fn build(api: &'a Api, recipients: &[String]) -> std::result::Result<Self, TransportCode> {
        let mut list = Self {
            api,
            head: ptr::null_mut(),
        };
        for recipient in recipients {
            let recipient =
                CString::new(recipient.as_str()).map_err(|_| TransportCode::BAD_FUNCTION_ARGUMENT)?;
            // SAFETY: `head` is NULL or a list built by curl_slist_append;
            // the entry is copied.
            let head = unsafe { (api.slist_append)(list.head, recipient.as_ptr()) };
            if head.is_null() {
                return Err(TransportCode::OUT_OF_MEMORY);
            }
            list.head = head;
        }
        Ok(list)
    }
}

impl Drop for Recipients<'_> {
    fn drop(&mut self) {
        if !self.head.is_null() {
            // SAFETY: `head` was built by curl_slist_append and is no longer
            // referenced by the easy handle.
            unsafe { (self.api.slist_free_all)(self.head) };
        }
    }
}

/// Read callback feeding the request body to libcurl.
///
/// `userdata` is the `Body` being uploaded.
pub(crate) extern "C" fn read_body(
    buffer: *mut c_char,
    size: size_t,
    nitems: size_t,
    userdata: *mut c_void,
) -> size_t {
    // SAFETY: READDATA is set to a live `Body` for the duration of perform.
    let Some(body) = (unsafe { userdata.cast::<Body>().as_mut() }) else {
        return CURL_READFUNC_ABORT;
    };
    let len = size.saturating_mul(nitems);
    if buffer.is_null() || len == 0 {
        return 0;
    }
    // SAFETY: libcurl provides `size * nitems` writable bytes.
    let out = unsafe { std::slice::from_raw_parts_mut(buffer.cast::<u8>(), len) };
    body.read(out)
}
