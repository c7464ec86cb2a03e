//! Binary entry point: process-level signal setup, then the session loop.

use mysh::Interpreter;

/// SIGINT handler: emit the newline the aborted line would have produced and
/// return, leaving the session alive. Only `write(2)` is used here — it is
/// async-signal-safe.
extern "C" fn absorb_interrupt(_signo: libc::c_int) {
    let newline = b"\n";
    unsafe {
        let _ = libc::write(libc::STDOUT_FILENO, newline.as_ptr().cast(), newline.len());
    }
}

fn main() {
    // A handler (not SIG_IGN) so the disposition resets to default on exec
    // and foreground children stay interruptible. While the interpreter
    // blocks in a foreground wait, Ctrl+C lands here and the wait resumes;
    // at the prompt the line editor absorbs Ctrl+C itself.
    let handler: extern "C" fn(libc::c_int) = absorb_interrupt;
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }

    let mut shell = Interpreter::new();
    if let Err(err) = shell.repl() {
        eprintln!("mysh: {err}");
        std::process::exit(1);
    }
}
