//! Raw-tier wrapper functions.
//!
//! `ExecuteWrapperFunction` does not invoke anything dynamically: a call names
//! one entry of the fixed [`WrapperFunction`] table and its arguments are
//! resolved into a typed [`Primitive`] before the dispatcher runs it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{NotFoundError, ParameterError, PharosError, TargetKind};
use crate::value::Input;

/// The supported low-level primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperFunction {
    Ping,
    GetStateId,
    ReadRegister,
    WriteRegister,
    ReadProperty,
    WriteProperty,
}

impl WrapperFunction {
    pub const ALL: [Self; 6] = [
        Self::Ping,
        Self::GetStateId,
        Self::ReadRegister,
        Self::WriteRegister,
        Self::ReadProperty,
        Self::WriteProperty,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ping => "Ping",
            Self::GetStateId => "GetStateId",
            Self::ReadRegister => "ReadRegister",
            Self::WriteRegister => "WriteRegister",
            Self::ReadProperty => "ReadProperty",
            Self::WriteProperty => "WriteProperty",
        }
    }

    /// Parameter names, in positional order.
    #[must_use]
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Self::Ping | Self::GetStateId => &[],
            Self::ReadRegister => &["address"],
            Self::WriteRegister => &["address", "value"],
            Self::ReadProperty => &["name"],
            Self::WriteProperty => &["name", "value"],
        }
    }

    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// JSON array of function names, as reported by `AvailableWrapperFunctions`.
    #[must_use]
    pub fn names_json() -> Vec<Value> {
        Self::ALL
            .into_iter()
            .map(|f| Value::String(f.name().to_string()))
            .collect()
    }
}

impl fmt::Display for WrapperFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of a wrapper call: a positional array or a keyword object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WrapperArgs {
    Positional(Vec<Value>),
    Keyword(serde_json::Map<String, Value>),
}

impl Default for WrapperArgs {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl WrapperArgs {
    fn get(&self, position: usize, name: &str) -> Option<&Value> {
        match self {
            Self::Positional(values) => values.get(position),
            Self::Keyword(map) => map.get(name),
        }
    }
}

/// Body of `POST /Raw/ExecuteWrapperFunction`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WrapperCall {
    pub function_name: String,
    #[serde(default)]
    pub args: WrapperArgs,
}

/// A resolved, fully typed wrapper invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Ping,
    GetStateId,
    ReadRegister { address: u16 },
    WriteRegister { address: u16, value: u32 },
    ReadProperty { name: String },
    WriteProperty { name: String, value: Input },
}

impl WrapperCall {
    /// Parse a request body.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::BadParameter`] when the body is not a JSON
    /// object with a `function_name` string.
    pub fn parse(body: &str) -> Result<Self, PharosError> {
        serde_json::from_str(body).map_err(|err| {
            ParameterError::Malformed {
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Resolve the call against the function table.
    ///
    /// # Errors
    ///
    /// Returns [`PharosError::NotFound`] for an unknown function and
    /// [`PharosError::BadParameter`] for a missing or mistyped argument.
    pub fn resolve(&self) -> Result<Primitive, PharosError> {
        let function = WrapperFunction::lookup(&self.function_name).ok_or_else(|| {
            NotFoundError {
                kind: TargetKind::WrapperFunction,
                name: self.function_name.clone(),
                tier: None,
            }
        })?;

        let primitive = match function {
            WrapperFunction::Ping => Primitive::Ping,
            WrapperFunction::GetStateId => Primitive::GetStateId,
            WrapperFunction::ReadRegister => Primitive::ReadRegister {
                address: self.unsigned(function, 0, u16::MAX.into())?,
            },
            WrapperFunction::WriteRegister => Primitive::WriteRegister {
                address: self.unsigned(function, 0, u16::MAX.into())?,
                value: self.unsigned(function, 1, u32::MAX.into())?,
            },
            WrapperFunction::ReadProperty => Primitive::ReadProperty {
                name: self.string(function, 0)?,
            },
            WrapperFunction::WriteProperty => Primitive::WriteProperty {
                name: self.string(function, 0)?,
                value: Input::Json(self.arg(function, 1)?.clone()),
            },
        };
        Ok(primitive)
    }

    fn arg(&self, function: WrapperFunction, position: usize) -> Result<&Value, PharosError> {
        let name = function.params()[position];
        self.args.get(position, name).ok_or_else(|| {
            ParameterError::MissingArgument {
                function: function.name().to_string(),
                argument: name,
            }
            .into()
        })
    }

    fn unsigned<T: TryFrom<u64>>(
        &self,
        function: WrapperFunction,
        position: usize,
        max: u64,
    ) -> Result<T, PharosError> {
        let value = self.arg(function, position)?;
        let label = format!("{function}.{}", function.params()[position]);
        let number = value.as_u64().ok_or_else(|| ParameterError::TypeMismatch {
            name: label.clone(),
            expected: "an unsigned integer".to_string(),
            got: value.to_string(),
        })?;
        T::try_from(number).map_err(|_| {
            ParameterError::OutOfRange {
                name: label,
                value: number.to_string(),
                range: format!("[0, {max}]"),
            }
            .into()
        })
    }

    fn string(&self, function: WrapperFunction, position: usize) -> Result<String, PharosError> {
        let value = self.arg(function, position)?;
        value.as_str().map(str::to_string).ok_or_else(|| {
            ParameterError::TypeMismatch {
                name: format!("{function}.{}", function.params()[position]),
                expected: "a string".to_string(),
                got: value.to_string(),
            }
            .into()
        })
    }
}

/// Sparse bank of simulated 32-bit registers. Unset registers read as zero.
#[derive(Debug, Clone, Default)]
pub struct RegisterBank {
    registers: BTreeMap<u16, u32>,
}

impl RegisterBank {
    #[must_use]
    pub fn read(&self, address: u16) -> u32 {
        self.registers.get(&address).copied().unwrap_or_default()
    }

    /// Store `value` and return the previous content.
    pub fn write(&mut self, address: u16, value: u32) -> u32 {
        self.registers.insert(address, value).unwrap_or_default()
    }
}
