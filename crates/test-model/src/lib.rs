//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hermitclaw_model::{
    CallResult, ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use tokio::time::sleep;

pub use preset::*;

/// The length of every vector produced by [`TestModelProvider::embed`].
pub const EMBEDDING_DIMENSIONS: usize = 8;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    failed_attempts: u64,
    requests: Vec<ModelRequest>,
}

impl Script {
    fn next_result(&mut self) -> Result<CallResult, Error> {
        let Some(preset) = self.responses.front() else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            });
        };
        match preset.failures {
            Some(0) => {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            Some(failures) if self.failed_attempts < failures => {
                self.failed_attempts += 1;
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            _ => {}
        }
        let result = preset.to_call_result();
        self.responses.pop_front();
        self.failed_attempts = 0;
        Ok(result)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to each call. Responses are consumed in
/// order, one per call. If there are no enough responses in the script, an
/// error will be returned.
///
/// Clones share the script, so a test can keep one handle to inspect the
/// requests after handing another to the code under test.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.with_script(|script| script.responses.push_back(preset));
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.with_script(|script| script.requests.clone())
    }

    /// Returns the number of responses not consumed yet.
    pub fn remaining(&self) -> usize {
        self.with_script(|script| script.responses.len())
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script =
            self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<CallResult, Self::Error>> + Send + 'static
    {
        let result = self.with_script(|script| {
            script.requests.push(req.clone());
            script.next_result()
        });
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        async move {
            sleep(delay).await;
            result
        }
    }

    fn embed(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<f32>, Self::Error>> + Send + 'static
    {
        // Byte sums folded into buckets, enough to tell texts apart.
        let mut vector = vec![0f32; EMBEDDING_DIMENSIONS];
        for (idx, byte) in text.bytes().enumerate() {
            vector[idx % EMBEDDING_DIMENSIONS] += f32::from(byte) / 255.0;
        }
        std::future::ready(Ok(vector))
    }
}
