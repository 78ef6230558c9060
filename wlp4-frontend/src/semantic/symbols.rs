//! Procedure signatures and per-procedure variable tables
//!
//! The table is built once by the checker and never mutated afterwards.
//! Stack offsets are not stored here; the code generator owns them.

use crate::ast::Dcl;
use crate::semantic::errors::SemanticError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wlp4_common::Type;

/// Signature and flat variable namespace of one procedure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureInfo {
    pub signature: Vec<Type>,
    pub variables: BTreeMap<String, Type>,
}

impl ProcedureInfo {
    /// Record a parameter: part of the signature and of the namespace
    pub fn declare_param(&mut self, dcl: &Dcl) -> Result<(), SemanticError> {
        self.declare_local(dcl)?;
        self.signature.push(dcl.ty);
        Ok(())
    }

    /// Record a local declaration
    pub fn declare_local(&mut self, dcl: &Dcl) -> Result<(), SemanticError> {
        if self.variables.contains_key(&dcl.name) {
            return Err(SemanticError::RedefinedVariable(dcl.name.clone()));
        }
        self.variables.insert(dcl.name.clone(), dcl.ty);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<Type> {
        self.variables.get(name).copied()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    procedures: BTreeMap<String, ProcedureInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure; names are unique across the program
    pub fn insert(&mut self, name: &str, info: ProcedureInfo) -> Result<(), SemanticError> {
        if self.procedures.contains_key(name) {
            return Err(SemanticError::RedefinedProcedure(name.to_string()));
        }
        debug!(
            "registered procedure {} ({} params, {} variables)",
            name,
            info.signature.len(),
            info.variables.len()
        );
        self.procedures.insert(name.to_string(), info);
        Ok(())
    }

    pub fn procedure(&self, name: &str) -> Option<&ProcedureInfo> {
        self.procedures.get(name)
    }

    pub fn has_procedure(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn procedures(&self) -> impl Iterator<Item = (&String, &ProcedureInfo)> {
        self.procedures.iter()
    }

    /// Type of `name` inside `procedure`
    pub fn variable_type(&self, procedure: &str, name: &str) -> Result<Type, SemanticError> {
        self.procedure(procedure)
            .and_then(|info| info.variable(name))
            .ok_or_else(|| SemanticError::MissingSymbol {
                procedure: procedure.to_string(),
                name: name.to_string(),
            })
    }

    pub fn signature(&self, procedure: &str) -> Result<&[Type], SemanticError> {
        self.procedure(procedure)
            .map(|info| info.signature.as_slice())
            .ok_or_else(|| SemanticError::UndeclaredProcedure(procedure.to_string()))
    }

    /// Pretty JSON dump for diagnostics
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
