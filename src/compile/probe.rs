/// Check whether `compiler` resolves to an executable on `PATH`.
///
/// Names containing a path separator are checked directly. The compiler itself is
/// never run; a missing compiler is an ordinary `false`, not an error.
pub fn is_compiler_available(compiler: &str) -> bool {
    if compiler.trim().is_empty() {
        return false;
    }
    which::which(compiler).is_ok()
}
