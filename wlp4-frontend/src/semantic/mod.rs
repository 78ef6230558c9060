//! Semantic analysis for WLP4
//!
//! Checking runs in two phases over the per-production model:
//!
//! - Phase A walks procedures in source order. Each one gets its signature
//!   and flat variable table, then every identifier it uses is resolved.
//!   A procedure is visible from its own body onward, so recursion works
//!   and forward calls do not.
//! - Phase B runs against the finished table and derives and validates
//!   every type. The first fault aborts the whole pass.

pub mod errors;
pub mod expressions;
pub mod symbols;

pub use errors::SemanticError;
pub use expressions::ExprTyper;
pub use symbols::{ProcedureInfo, SymbolTable};

use crate::ast::*;
use log::debug;
use wlp4_common::Type;

/// A program that passed checking, with the table later stages read from
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedProgram {
    pub program: Program,
    pub symbols: SymbolTable,
}

pub struct TypeChecker {
    table: SymbolTable,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
        }
    }

    /// Run both phases, consuming the program
    pub fn check(mut self, program: Program) -> Result<CheckedProgram, SemanticError> {
        for procedure in &program.procedures {
            self.register_procedure(procedure)?;
        }
        self.register_main(&program.main)?;

        for procedure in &program.procedures {
            self.check_procedure(procedure)?;
        }
        self.check_main(&program.main)?;

        Ok(CheckedProgram {
            program,
            symbols: self.table,
        })
    }

    // Phase A

    fn register_procedure(&mut self, procedure: &Procedure) -> Result<(), SemanticError> {
        let mut info = ProcedureInfo::default();
        for param in &procedure.params {
            info.declare_param(param)?;
        }
        for declaration in &procedure.body.declarations {
            info.declare_local(&declaration.dcl)?;
        }
        self.table.insert(&procedure.name, info)?;
        self.resolve_body(&procedure.name, &procedure.body)
    }

    fn register_main(&mut self, main: &Main) -> Result<(), SemanticError> {
        let mut info = ProcedureInfo::default();
        for param in main.params() {
            info.declare_param(param)?;
        }
        for declaration in &main.body.declarations {
            info.declare_local(&declaration.dcl)?;
        }
        self.table.insert(Main::NAME, info)?;
        self.resolve_body(Main::NAME, &main.body)
    }

    fn resolve_body(&self, procedure: &str, body: &Body) -> Result<(), SemanticError> {
        let resolver = Resolver {
            table: &self.table,
            procedure,
        };
        for statement in &body.statements {
            resolver.statement(statement)?;
        }
        resolver.expr(&body.ret)
    }

    // Phase B

    fn check_procedure(&self, procedure: &Procedure) -> Result<(), SemanticError> {
        debug!("checking procedure {}", procedure.name);
        let typer = ExprTyper::new(&self.table, &procedure.name)?;
        self.check_body(&typer, &procedure.body)?;
        if typer.type_of(&procedure.body.ret)? != Type::Int {
            return Err(SemanticError::ProcedureReturn(procedure.name.clone()));
        }
        Ok(())
    }

    fn check_main(&self, main: &Main) -> Result<(), SemanticError> {
        debug!("checking procedure {}", Main::NAME);
        if main.second.ty != Type::Int {
            return Err(SemanticError::WainSecondParameter);
        }
        let typer = ExprTyper::new(&self.table, Main::NAME)?;
        self.check_body(&typer, &main.body)?;
        if typer.type_of(&main.body.ret)? != Type::Int {
            return Err(SemanticError::WainReturn);
        }
        Ok(())
    }

    fn check_body(&self, typer: &ExprTyper<'_>, body: &Body) -> Result<(), SemanticError> {
        for declaration in &body.declarations {
            check_declaration(declaration)?;
        }
        for statement in &body.statements {
            check_statement(typer, statement)?;
        }
        Ok(())
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn check_declaration(declaration: &Declaration) -> Result<(), SemanticError> {
    match (declaration.init, declaration.dcl.ty) {
        (Initializer::Num(_), Type::Int) | (Initializer::Null, Type::IntPointer) => Ok(()),
        (Initializer::Num(_), ty) => Err(SemanticError::NumInitializer(ty)),
        (Initializer::Null, ty) => Err(SemanticError::NullInitializer(ty)),
    }
}

fn check_statement(typer: &ExprTyper<'_>, statement: &Statement) -> Result<(), SemanticError> {
    match statement {
        Statement::Assign { target, value } => {
            let target = typer.lvalue_type(target)?;
            let value = typer.type_of(value)?;
            if target != value {
                return Err(SemanticError::Assignment { target, value });
            }
        }
        Statement::If {
            test,
            then_branch,
            else_branch,
        } => {
            check_test(typer, test)?;
            for s in then_branch.iter().chain(else_branch) {
                check_statement(typer, s)?;
            }
        }
        Statement::While { test, body } => {
            check_test(typer, test)?;
            for s in body {
                check_statement(typer, s)?;
            }
        }
        Statement::Println(expr) => match typer.type_of(expr)? {
            Type::Int => {}
            other => return Err(SemanticError::PrintlnArgument(other)),
        },
        Statement::Delete(expr) => match typer.type_of(expr)? {
            Type::IntPointer => {}
            other => return Err(SemanticError::DeleteArgument(other)),
        },
    }
    Ok(())
}

fn check_test(typer: &ExprTyper<'_>, test: &Test) -> Result<(), SemanticError> {
    let lhs = typer.type_of(&test.lhs)?;
    let rhs = typer.type_of(&test.rhs)?;
    if lhs != rhs {
        return Err(SemanticError::Comparison { lhs, rhs });
    }
    Ok(())
}

/// Phase A use check: every name resolves in the table built so far
struct Resolver<'a> {
    table: &'a SymbolTable,
    procedure: &'a str,
}

impl Resolver<'_> {
    fn variable(&self, name: &str) -> Result<(), SemanticError> {
        let known = self
            .table
            .procedure(self.procedure)
            .is_some_and(|info| info.has_variable(name));
        if known {
            Ok(())
        } else {
            Err(SemanticError::UndeclaredVariable(name.to_string()))
        }
    }

    fn statement(&self, statement: &Statement) -> Result<(), SemanticError> {
        match statement {
            Statement::Assign { target, value } => {
                self.lvalue(target)?;
                self.expr(value)
            }
            Statement::If {
                test,
                then_branch,
                else_branch,
            } => {
                self.test(test)?;
                then_branch
                    .iter()
                    .chain(else_branch)
                    .try_for_each(|s| self.statement(s))
            }
            Statement::While { test, body } => {
                self.test(test)?;
                body.iter().try_for_each(|s| self.statement(s))
            }
            Statement::Println(expr) | Statement::Delete(expr) => self.expr(expr),
        }
    }

    fn test(&self, test: &Test) -> Result<(), SemanticError> {
        self.expr(&test.lhs)?;
        self.expr(&test.rhs)
    }

    fn lvalue(&self, lvalue: &LValue) -> Result<(), SemanticError> {
        match lvalue {
            LValue::Id(name) => self.variable(name),
            LValue::Deref(inner) => self.expr(inner),
        }
    }

    fn expr(&self, expr: &Expr) -> Result<(), SemanticError> {
        match expr {
            Expr::Num(_) | Expr::Null => Ok(()),
            Expr::Id(name) => self.variable(name),
            Expr::AddressOf(lvalue) => self.lvalue(lvalue),
            Expr::Deref(inner) | Expr::New(inner) => self.expr(inner),
            Expr::Call { name, args } => {
                if !self.table.has_procedure(name) {
                    return Err(SemanticError::UndeclaredProcedure(name.clone()));
                }
                args.iter().try_for_each(|arg| self.expr(arg))
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs)?;
                self.expr(rhs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frontend;
    use wlp4_common::ErrorKind;

    fn check(source: &str) -> Result<CheckedProgram, SemanticError> {
        let grammar = crate::grammar::Grammar::wlp4().unwrap();
        let program = Frontend::parse_program(source, &grammar).unwrap();
        TypeChecker::new().check(program)
    }

    fn kind_of(source: &str) -> ErrorKind {
        check(source).unwrap_err().kind()
    }

    #[test]
    fn test_well_typed_program() {
        let checked = check(
            "int f(int* p, int n) { int s = 0; while (n > 0) { s = s + *(p + n - 1); n = n - 1; } return s; } \
             int wain(int* a, int b) { int* q = NULL; q = new int[b]; if (q == NULL) { } else { delete [] q; } return f(a, b); }",
        )
        .unwrap();
        let f = checked.symbols.procedure("f").unwrap();
        assert_eq!(f.signature, vec![Type::IntPointer, Type::Int]);
        assert_eq!(f.variable("s"), Some(Type::Int));
        assert!(checked.symbols.has_procedure("wain"));
    }

    #[test]
    fn test_redefinitions() {
        assert_eq!(
            check("int f() { return 1; } int f() { return 2; } int wain(int a, int b) { return a; }"),
            Err(SemanticError::RedefinedProcedure("f".to_string()))
        );
        assert_eq!(
            check("int wain(int a, int b) { int a = 0; return a; }"),
            Err(SemanticError::RedefinedVariable("a".to_string()))
        );
        assert_eq!(
            kind_of("int f(int x) { int y = 0; int y = 1; return x; } int wain(int a, int b) { return a; }"),
            ErrorKind::Redefinition
        );
    }

    #[test]
    fn test_undeclared_names() {
        assert_eq!(
            check("int wain(int a, int b) { return c; }"),
            Err(SemanticError::UndeclaredVariable("c".to_string()))
        );
        // Variables of another procedure are out of scope
        assert_eq!(
            kind_of("int f() { int z = 0; return z; } int wain(int a, int b) { z = 1; return a; }"),
            ErrorKind::Undeclared
        );
        // Procedures are visible only after their definition
        assert_eq!(
            check("int f() { return g(); } int g() { return 1; } int wain(int a, int b) { return f(); }"),
            Err(SemanticError::UndeclaredProcedure("g".to_string()))
        );
        assert!(check("int f(int n) { return f(n); } int wain(int a, int b) { return f(a); }").is_ok());
    }

    #[test]
    fn test_overshadowed_procedure() {
        assert_eq!(
            check("int f() { return 1; } int wain(int a, int f) { return f(); }"),
            Err(SemanticError::OvershadowedProcedure("f".to_string()))
        );
    }

    #[test]
    fn test_overshadowing_is_found_while_typing() {
        // An earlier type error in the same body is reported first
        assert_eq!(
            kind_of("int f() { return 1; } int wain(int a, int b) { int* p = NULL; int f = 0; a = p; return f(); }"),
            ErrorKind::TypeCorrectness
        );
        // A shadowed call in an earlier procedure beats a type error in a later one
        assert_eq!(
            check("int f() { return 1; } int g(int f) { return f(); } int wain(int a, int* b) { return a; }"),
            Err(SemanticError::OvershadowedProcedure("f".to_string()))
        );
    }

    #[test]
    fn test_statement_rules() {
        assert_eq!(
            check("int wain(int* a, int b) { b = a; return b; }"),
            Err(SemanticError::Assignment { target: Type::Int, value: Type::IntPointer })
        );
        assert_eq!(
            check("int wain(int* a, int b) { if (a < b) { } else { } return b; }"),
            Err(SemanticError::Comparison { lhs: Type::IntPointer, rhs: Type::Int })
        );
        assert_eq!(
            check("int wain(int* a, int b) { println(a); return b; }"),
            Err(SemanticError::PrintlnArgument(Type::IntPointer))
        );
        assert_eq!(
            check("int wain(int* a, int b) { delete [] b; return b; }"),
            Err(SemanticError::DeleteArgument(Type::Int))
        );
        assert_eq!(
            check("int wain(int a, int b) { int* p = 5; return a; }"),
            Err(SemanticError::NumInitializer(Type::IntPointer))
        );
        assert_eq!(
            check("int wain(int a, int b) { int p = NULL; return a; }"),
            Err(SemanticError::NullInitializer(Type::Int))
        );
    }

    #[test]
    fn test_procedure_rules() {
        assert_eq!(
            check("int wain(int a, int* b) { return a; }"),
            Err(SemanticError::WainSecondParameter)
        );
        assert_eq!(
            check("int wain(int* a, int b) { return a; }"),
            Err(SemanticError::WainReturn)
        );
        assert_eq!(
            check("int f(int* p) { return p; } int wain(int a, int b) { return a; }"),
            Err(SemanticError::ProcedureReturn("f".to_string()))
        );
    }
}
