use core::fmt;

use crate::engine::EngineError;

/// Conditions the pipeline cannot continue from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// More buffers requested than the queue can hold
    QueueCapacity { requested: usize, max: usize },
    /// A semaphore was released past its maximum
    Semaphore(&'static str),
    /// The inference engine reported an unexpected status
    Engine(EngineError),
    /// The camera pipe refused a command
    Pipe(&'static str),
    /// The compositor or the draw target failed
    Display(&'static str),
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fatal::QueueCapacity { requested, max } => {
                write!(f, "buffer queue capacity exceeded: {} > {}", requested, max)
            }
            Fatal::Semaphore(name) => write!(f, "semaphore overflow: {}", name),
            Fatal::Engine(err) => write!(f, "inference engine failure: {}", err),
            Fatal::Pipe(what) => write!(f, "camera pipe failure: {}", what),
            Fatal::Display(what) => write!(f, "display failure: {}", what),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Fatal {}

impl From<EngineError> for Fatal {
    fn from(err: EngineError) -> Self {
        Fatal::Engine(err)
    }
}

/// Stops the pipeline. On target the panic handler parks the core, which
/// leaves the last rendered frame on screen.
pub fn halt(fatal: Fatal) -> ! {
    log::error!("fatal: {}", fatal);
    panic!("{}", fatal)
}
