use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AbinsResult<T> = Result<T, AbinsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbinsErrorCategory {
    Success,
    ConfigurationError,
    StructuralValidationError,
    TypeMismatchError,
    UnimplementedPathError,
    IoSystemError,
    InternalError,
}

impl AbinsErrorCategory {
    pub const fn exit_status(self) -> ExitStatus {
        match self {
            Self::Success => ExitStatus {
                exit_code: 0,
                category_name: "Success",
                class: "SUCCESS",
            },
            Self::ConfigurationError => ExitStatus {
                exit_code: 2,
                category_name: "ConfigurationError",
                class: "CONFIG_FATAL",
            },
            Self::StructuralValidationError => ExitStatus {
                exit_code: 3,
                category_name: "StructuralValidationError",
                class: "INPUT_FATAL",
            },
            Self::TypeMismatchError => ExitStatus {
                exit_code: 4,
                category_name: "TypeMismatchError",
                class: "TYPE_FATAL",
            },
            Self::UnimplementedPathError => ExitStatus {
                exit_code: 5,
                category_name: "UnimplementedPathError",
                class: "UNIMPLEMENTED",
            },
            Self::IoSystemError => ExitStatus {
                exit_code: 6,
                category_name: "IoSystemError",
                class: "IO_FATAL",
            },
            Self::InternalError => ExitStatus {
                exit_code: 7,
                category_name: "InternalError",
                class: "SYS_FATAL",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_status().exit_code
    }

    pub const fn category_name(self) -> &'static str {
        self.exit_status().category_name
    }

    pub const fn class(self) -> &'static str {
        self.exit_status().class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub exit_code: i32,
    pub category_name: &'static str,
    pub class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbinsError {
    category: AbinsErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl AbinsError {
    pub fn new(
        category: AbinsErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AbinsErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn structural(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            AbinsErrorCategory::StructuralValidationError,
            placeholder,
            message,
        )
    }

    pub fn type_mismatch(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AbinsErrorCategory::TypeMismatchError, placeholder, message)
    }

    pub fn unimplemented(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            AbinsErrorCategory::UnimplementedPathError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AbinsErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AbinsErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> AbinsErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for AbinsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.category_name(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for AbinsError {}

#[cfg(test)]
mod tests {
    use super::{AbinsError, AbinsErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (AbinsErrorCategory::Success, 0, "Success", "SUCCESS"),
            (
                AbinsErrorCategory::ConfigurationError,
                2,
                "ConfigurationError",
                "CONFIG_FATAL",
            ),
            (
                AbinsErrorCategory::StructuralValidationError,
                3,
                "StructuralValidationError",
                "INPUT_FATAL",
            ),
            (
                AbinsErrorCategory::TypeMismatchError,
                4,
                "TypeMismatchError",
                "TYPE_FATAL",
            ),
            (
                AbinsErrorCategory::UnimplementedPathError,
                5,
                "UnimplementedPathError",
                "UNIMPLEMENTED",
            ),
            (
                AbinsErrorCategory::IoSystemError,
                6,
                "IoSystemError",
                "IO_FATAL",
            ),
            (
                AbinsErrorCategory::InternalError,
                7,
                "InternalError",
                "SYS_FATAL",
            ),
        ];

        for (category, exit_code, category_name, class) in cases {
            let status = category.exit_status();
            assert_eq!(status.exit_code, exit_code);
            assert_eq!(status.category_name, category_name);
            assert_eq!(status.class, class);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = AbinsError::configuration(
            "CONFIG.TEMPERATURE",
            "Temperature cannot be negative.",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [CONFIG.TEMPERATURE] Temperature cannot be negative."
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 2")
        );
        assert_eq!(
            error.to_string(),
            "ConfigurationError [CONFIG.TEMPERATURE] Temperature cannot be negative."
        );
    }

    #[test]
    fn success_category_is_not_fatal() {
        let error = AbinsError::new(AbinsErrorCategory::Success, "OK", "done");
        assert_eq!(error.diagnostic_line(), "INFO: [OK] done");
        assert!(error.fatal_exit_line().is_none());
    }
}
