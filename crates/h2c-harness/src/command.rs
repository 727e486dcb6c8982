//! Typed h2c command lines

use std::fmt;
use std::path::PathBuf;

/// A single h2c invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum H2cCommand {
    /// Start the persistent h2c process
    Start,
    /// Connect the running process to `host:port`
    Connect {
        /// Target authority
        authority: String,
    },
    /// Drop the current connection
    Disconnect,
    /// GET a path
    Get {
        /// Request path, including any query string
        path: String,
    },
    /// PUT a file's contents to a path
    Put {
        /// Request body source
        file: PathBuf,
        /// Request path
        path: String,
    },
    /// POST a file's contents to a path
    Post {
        /// Request body source
        file: PathBuf,
        /// Request path
        path: String,
    },
    /// Add a header to every subsequent request
    Set {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },
    /// Remove a header, or one of its values
    Unset {
        /// Header name
        name: String,
        /// Value to remove; all values when `None`
        value: Option<String>,
    },
    /// Send ping frames
    Ping,
    /// Print the process id of the h2c process
    Pid,
    /// List streams and their state
    StreamInfo,
    /// List responses available as push promises
    PushList,
    /// Stop the persistent h2c process
    Stop,
    /// Print the h2c version
    Version,
}

impl H2cCommand {
    /// Command name as h2c expects it
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Connect { .. } => "connect",
            Self::Disconnect => "disconnect",
            Self::Get { .. } => "get",
            Self::Put { .. } => "put",
            Self::Post { .. } => "post",
            Self::Set { .. } => "set",
            Self::Unset { .. } => "unset",
            Self::Ping => "ping",
            Self::Pid => "pid",
            Self::StreamInfo => "stream-info",
            Self::PushList => "push-list",
            Self::Stop => "stop",
            Self::Version => "version",
        }
    }

    /// Argument vector, excluding the binary itself
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string()];
        match self {
            Self::Connect { authority } => args.push(authority.clone()),
            Self::Get { path } => args.push(path.clone()),
            Self::Put { file, path } | Self::Post { file, path } => {
                args.push("--file".to_string());
                args.push(file.to_string_lossy().to_string());
                args.push(path.clone());
            }
            Self::Set { name, value } => {
                args.push(name.clone());
                args.push(value.clone());
            }
            Self::Unset { name, value } => {
                args.push(name.clone());
                if let Some(value) = value {
                    args.push(value.clone());
                }
            }
            Self::Start
            | Self::Disconnect
            | Self::Ping
            | Self::Pid
            | Self::StreamInfo
            | Self::PushList
            | Self::Stop
            | Self::Version => {}
        }
        args
    }
}

impl fmt::Display for H2cCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h2c {}", self.args().join(" "))
    }
}

/// Path with a `size` query parameter appended
pub fn sized_path(path: &str, size: i64) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}size={}", path, separator, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let test_cases = vec![
            (H2cCommand::Start, vec!["start"]),
            (
                H2cCommand::Connect { authority: "localhost:8443".to_string() },
                vec!["connect", "localhost:8443"],
            ),
            (
                H2cCommand::Get { path: "/h2c/test?size=66000".to_string() },
                vec!["get", "/h2c/test?size=66000"],
            ),
            (
                H2cCommand::Post {
                    file: PathBuf::from("/tmp/h2c-test-data-1.dat"),
                    path: "/h2c/test".to_string(),
                },
                vec!["post", "--file", "/tmp/h2c-test-data-1.dat", "/h2c/test"],
            ),
            (
                H2cCommand::Put {
                    file: PathBuf::from("/tmp/data.dat"),
                    path: "/h2c/test".to_string(),
                },
                vec!["put", "--file", "/tmp/data.dat", "/h2c/test"],
            ),
            (
                H2cCommand::Set { name: "x-trace".to_string(), value: "on".to_string() },
                vec!["set", "x-trace", "on"],
            ),
            (
                H2cCommand::Unset { name: "x-trace".to_string(), value: None },
                vec!["unset", "x-trace"],
            ),
            (
                H2cCommand::Unset { name: "x-trace".to_string(), value: Some("on".to_string()) },
                vec!["unset", "x-trace", "on"],
            ),
            (H2cCommand::StreamInfo, vec!["stream-info"]),
            (H2cCommand::PushList, vec!["push-list"]),
            (H2cCommand::Stop, vec!["stop"]),
        ];

        for (command, expected) in test_cases {
            assert_eq!(command.args(), expected, "Failed for command: {:?}", command);
        }
    }

    #[test]
    fn test_display_is_full_command_line() {
        let command = H2cCommand::Get { path: "/h2c/test".to_string() };
        assert_eq!(command.to_string(), "h2c get /h2c/test");
        assert_eq!(H2cCommand::Pid.to_string(), "h2c pid");
    }

    #[test]
    fn test_sized_path() {
        assert_eq!(sized_path("/h2c/test", 66000), "/h2c/test?size=66000");
        assert_eq!(sized_path("/h2c/test?x=1", 10), "/h2c/test?x=1&size=10");
    }
}
