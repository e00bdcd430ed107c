use std::fmt;

#[derive(Debug)]
pub enum Error {
    MissingVar(&'static str),
    InvalidVar { name: &'static str, value: String },
    ZeroInterval(&'static str),
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidArgument(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(name) => write!(f, "set ENV variable {name}"),
            Self::InvalidVar { name, value } => {
                write!(f, "ENV variable {name} has invalid value {value:?}")
            }
            Self::ZeroInterval(name) => write!(f, "ENV variable {name} must not be 0"),
            Self::UnknownCommand(command) => write!(f, "unknown command {command:?}, try `help`"),
            Self::MissingArgument(argument) => write!(f, "missing {argument}"),
            Self::InvalidArgument(argument) => write!(f, "invalid argument {argument:?}"),
        }
    }
}

impl std::error::Error for Error {}
