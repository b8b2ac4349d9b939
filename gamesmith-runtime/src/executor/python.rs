//! Python backend: runs the source in a fresh `python3` child process.
//!
//! The child runs a small prelude that swaps `builtins.input` and
//! `sys.stdin` for versions that ask the supervisor for each line (see
//! `frame`), reads the program source as the first JSON line on stdin, and
//! `exec`s it in a new `__main__` namespace. File descriptor 0 is pointed at
//! the null device, so only the prelude can read the answer pipe. The supervisor never shares its own state with the
//! program; stderr is left attached to the real terminal.

use super::frame::{Frame, FrameDecoder};
use super::interpreter::{GameIo, Interpreter};
use crate::error::{self, Error, Result};
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

const PRELUDE: &str = r#"
import builtins, io, json, os, sys

_channel = sys.stdout
_answers = os.fdopen(os.dup(0), "r", encoding="utf-8")
_null = os.open(os.devnull, os.O_RDONLY)
os.dup2(_null, 0)
os.close(_null)

def _frame(kind, payload):
    _channel.write("\x1e" + kind + " " + json.dumps(payload) + "\n")
    _channel.flush()

def _readline(prompt=""):
    _frame("INPUT", str(prompt))
    return _answers.readline()

def _input(prompt=""):
    line = _readline(prompt)
    if not line:
        raise EOFError("EOF when reading a line")
    return line[:-1] if line.endswith("\n") else line

class _Stdin(io.TextIOBase):
    def __init__(self):
        self._pending = ""

    def readable(self):
        return True

    def isatty(self):
        return False

    def readline(self, size=-1):
        if not self._pending:
            self._pending = _readline()
        if size is None or size < 0 or size >= len(self._pending):
            line, self._pending = self._pending, ""
        else:
            line, self._pending = self._pending[:size], self._pending[size:]
        return line

    def read(self, size=-1):
        chunks = []
        wanted = -1 if size is None else size
        while wanted != 0:
            line = self.readline(wanted)
            if not line:
                break
            chunks.append(line)
            if wanted > 0:
                wanted -= len(line)
        return "".join(chunks)

    def __iter__(self):
        return self

    def __next__(self):
        line = self.readline()
        if not line:
            raise StopIteration
        return line

builtins.input = _input
sys.stdin = sys.__stdin__ = _Stdin()
_source = json.loads(_answers.readline())
try:
    exec(compile(_source, "<game>", "exec"), {"__name__": "__main__", "__builtins__": builtins})
except SystemExit as exc:
    if exc.code not in (None, 0):
        _frame("ERROR", str(exc.code))
        sys.exit(1)
except BaseException as exc:
    _frame("ERROR", str(exc))
    sys.exit(1)
"#;

/// Runs Python source with a real `python3` (or another configured binary)
#[derive(Debug, Clone)]
pub struct PythonInterpreter {
    program: String,
}

impl PythonInterpreter {
    pub fn new() -> Self {
        Self::with_program("python3")
    }

    /// Use a specific interpreter binary (e.g. a virtualenv's python)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the interpreter binary can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn spawn(&self) -> Result<ChildGuard> {
        let child = Command::new(&self.program)
            .arg("-u")
            .arg("-c")
            .arg(PRELUDE)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| error::interpreter_unavailable(&self.program, e.to_string()))?;
        Ok(ChildGuard(child))
    }
}

impl Default for PythonInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter for PythonInterpreter {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, source: &str, io: &mut dyn GameIo) -> Result<()> {
        let mut child = self.spawn()?;
        let mut stdin = child.0.stdin.take();
        let mut stdout = child
            .0
            .stdout
            .take()
            .ok_or_else(|| Error::unexpected("child stdout was not captured"))?;

        let encoded = serde_json::to_string(source).map_err(|e| {
            Error::unexpected("program source could not be encoded").set_source(e)
        })?;
        send_line(&mut stdin, &encoded)?;

        let mut decoder = FrameDecoder::new();
        let mut fault = None;
        let mut buf = [0u8; 4096];

        loop {
            let n = match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e).with_operation("python::read")),
            };
            decoder.push(&buf[..n]);

            while let Some(frame) = decoder.next_frame() {
                match frame {
                    Frame::Output(text) => io.print(&text)?,
                    // Input already closed: the child gets EOF on its own.
                    Frame::Input(_) if stdin.is_none() => {}
                    Frame::Input(prompt) => match io.input(&prompt) {
                        Ok(answer) => send_line(&mut stdin, &answer)?,
                        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                            tracing::debug!("player input closed, closing child stdin");
                            stdin = None;
                        }
                        Err(e) => return Err(Error::from(e).with_operation("python::input")),
                    },
                    Frame::Fault(message) => fault = Some(message),
                }
            }
        }
        if let Some(Frame::Output(text)) = decoder.finish() {
            io.print(&text)?;
        }

        drop(stdin);
        let status = child
            .0
            .wait()
            .map_err(|e| Error::from(e).with_operation("python::wait"))?;

        if let Some(message) = fault {
            return Err(error::execution_fault(message));
        }
        if !status.success() {
            return Err(error::execution_fault(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

/// Write one line to the child. A child that already exited is not an
/// error here; its exit status is checked once its output ends.
fn send_line(stdin: &mut Option<ChildStdin>, line: &str) -> Result<()> {
    let Some(pipe) = stdin.as_mut() else {
        return Ok(());
    };
    let line = line.split('\n').next().unwrap_or_default();

    match pipe
        .write_all(line.as_bytes())
        .and_then(|_| pipe.write_all(b"\n"))
        .and_then(|_| pipe.flush())
    {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            *stdin = None;
            Ok(())
        }
        Err(e) => Err(Error::from(e).with_operation("python::write")),
    }
}

/// Kills and reaps the child on every exit path
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            let _ = self.0.kill();
        }
        let _ = self.0.wait();
    }
}
