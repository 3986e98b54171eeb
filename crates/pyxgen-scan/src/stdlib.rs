//! Top-level standard library module names
//!
//! The scanner answers these without launching an interpreter. Only modules
//! shipped by every CPython 3.8+ build on the current platform family are
//! listed; anything optional or newer goes through the probe.

const STDLIB_MODULES: &[&str] = &[
    "__future__", "_thread", "abc", "argparse", "array", "ast", "asyncio", "atexit", "base64",
    "bdb", "binascii", "bisect", "builtins", "calendar", "cmath", "cmd", "code", "codecs",
    "collections", "colorsys", "compileall", "concurrent", "configparser", "contextlib",
    "contextvars", "copy", "copyreg", "cProfile", "csv", "dataclasses", "datetime", "decimal",
    "difflib", "dis", "doctest", "email", "encodings", "enum", "errno", "faulthandler", "filecmp",
    "fileinput", "fnmatch", "fractions", "ftplib", "functools", "gc", "getopt", "getpass",
    "gettext", "glob", "gzip", "hashlib", "heapq", "hmac", "html", "http", "imaplib", "importlib",
    "inspect", "io", "ipaddress", "itertools", "json", "keyword", "linecache", "locale",
    "logging", "mailbox", "marshal", "math", "mimetypes", "mmap", "modulefinder",
    "multiprocessing", "netrc", "numbers", "operator", "optparse", "os", "pathlib", "pdb",
    "pickle", "pickletools", "pkgutil", "platform", "plistlib", "poplib", "pprint", "profile",
    "pstats", "py_compile", "pyclbr", "pydoc", "queue", "quopri", "random", "re", "reprlib",
    "rlcompleter", "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex",
    "shutil", "signal", "site", "smtplib", "socket", "socketserver", "stat", "statistics",
    "string", "stringprep", "struct", "subprocess", "symtable", "sys", "sysconfig", "tabnanny",
    "tarfile", "tempfile", "textwrap", "threading", "time", "timeit", "token", "tokenize",
    "trace", "traceback", "tracemalloc", "types", "typing", "unicodedata", "unittest", "urllib",
    "uuid", "warnings", "wave", "weakref", "webbrowser", "wsgiref", "xml", "xmlrpc", "zipapp",
    "zipfile", "zipimport", "zlib",
];

const UNIX_MODULES: &[&str] = &[
    "fcntl", "grp", "posix", "pty", "pwd", "resource", "syslog", "termios", "tty",
];

const WINDOWS_MODULES: &[&str] = &["msvcrt", "nt", "winreg", "winsound"];

/// Check if `name` is a top-level standard library module available on
/// this platform.
pub fn is_stdlib(name: &str) -> bool {
    STDLIB_MODULES.contains(&name)
        || (cfg!(unix) && UNIX_MODULES.contains(&name))
        || (cfg!(windows) && WINDOWS_MODULES.contains(&name))
}
