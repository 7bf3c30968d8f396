use crate::value::Value;

/// A stable token the core stores on a Client/Connector so its coroutine
/// survives until the connection is freed. Opaque to the core; only the
/// interpreter that issued it knows what it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoroutineHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Ok,
    Yielded,
    Failed,
}

/// One interpreter instance per worker thread.
pub trait Interpreter {
    type Coroutine: Coroutine;

    /// Loads the bootstrap script plus each configured module's bytecode.
    /// Invoked once at boot, before any coroutine is created.
    fn load_script(&mut self, bytes: &[u8]) -> Result<(), String>;

    /// Allocates a new coroutine bound to a fresh connection and returns a
    /// stable handle the core can hold onto.
    fn new_coroutine(&mut self) -> (Self::Coroutine, CoroutineHandle);

    /// Releases a coroutine's resources. Called from `on_close`.
    fn release_coroutine(&mut self, handle: CoroutineHandle);

    fn last_error(&self) -> Option<String>;
}

/// One coroutine per connected Client/Connector.
pub trait Coroutine {
    /// Pushes typed parameters then either `pcall`s (idle coroutine) or
    /// `resume`s (previously yielded) the named entry point.
    fn call(&mut self, entry: &str, params: &[Value<'_>]) -> CallOutcome;
}

/// Test double standing in for a real embedded scripting runtime: every
/// call succeeds and discards its parameters, which is enough to exercise
/// the I/O stack end to end without a language binding.
#[derive(Default)]
pub struct NullInterpreter {
    coroutine_seq: u64,
}

pub struct NullCoroutine;

impl Coroutine for NullCoroutine {
    fn call(&mut self, _entry: &str, _params: &[Value<'_>]) -> CallOutcome {
        CallOutcome::Ok
    }
}

impl Interpreter for NullInterpreter {
    type Coroutine = NullCoroutine;

    fn load_script(&mut self, _bytes: &[u8]) -> Result<(), String> {
        Ok(())
    }

    fn new_coroutine(&mut self) -> (Self::Coroutine, CoroutineHandle) {
        self.coroutine_seq += 1;
        (NullCoroutine, CoroutineHandle(self.coroutine_seq))
    }

    fn release_coroutine(&mut self, _handle: CoroutineHandle) {}

    fn last_error(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_interpreter_always_succeeds() {
        let mut interp = NullInterpreter::default();
        let (mut coro, handle) = interp.new_coroutine();
        assert_eq!(coro.call("on_connect", &[Value::I32(1)]), CallOutcome::Ok);
        interp.release_coroutine(handle);
    }

    #[test]
    fn coroutine_handles_are_distinct() {
        let mut interp = NullInterpreter::default();
        let (_, a) = interp.new_coroutine();
        let (_, b) = interp.new_coroutine();
        assert_ne!(a, b);
    }
}
