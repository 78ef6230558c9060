//! Syntax tree to per-production model conversion
//!
//! Every internal node is matched against the full child-symbol sequence of
//! its production. A node whose shape matches no production is rejected
//! instead of falling through to a default.

use super::*;
use crate::tree::SyntaxTree;
use thiserror::Error;
use wlp4_common::CompilerError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("malformed tree: no production {0}")]
    Malformed(String),

    #[error("malformed tree: expected a {expected} leaf, found {found}")]
    ExpectedLeaf { expected: String, found: String },

    #[error("malformed tree: invalid numeric literal {0}")]
    InvalidNumber(String),
}

impl From<ConversionError> for CompilerError {
    fn from(err: ConversionError) -> Self {
        CompilerError::unknown(err.to_string())
    }
}

type Result<T> = std::result::Result<T, ConversionError>;

fn malformed(node: &SyntaxTree) -> ConversionError {
    ConversionError::Malformed(node.line())
}

fn leaf<'t>(node: &'t SyntaxTree, expected: &str) -> Result<&'t str> {
    match node {
        SyntaxTree::Leaf(t) if t.symbol == expected => Ok(&t.lexeme),
        other => Err(ConversionError::ExpectedLeaf {
            expected: expected.to_string(),
            found: other.symbol().to_string(),
        }),
    }
}

fn number(node: &SyntaxTree) -> Result<i32> {
    let lexeme = leaf(node, "NUM")?;
    lexeme
        .parse()
        .map_err(|_| ConversionError::InvalidNumber(lexeme.to_string()))
}

/// Convert a parsed `start` tree into a [`Program`]
pub fn convert_program(tree: &SyntaxTree) -> Result<Program> {
    let ["BOF", "procedures", "EOF"] = tree.child_symbols().as_slice() else {
        return Err(malformed(tree));
    };
    if tree.symbol() != "start" {
        return Err(malformed(tree));
    }

    let mut procedures = Vec::new();
    let mut node = &tree.children()[1];
    loop {
        let children = node.children();
        match (node.symbol(), node.child_symbols().as_slice()) {
            ("procedures", ["procedure", "procedures"]) => {
                procedures.push(convert_procedure(&children[0])?);
                node = &children[1];
            }
            ("procedures", ["main"]) => {
                let main = convert_main(&children[0])?;
                return Ok(Program { procedures, main });
            }
            _ => return Err(malformed(node)),
        }
    }
}

fn convert_procedure(node: &SyntaxTree) -> Result<Procedure> {
    let c = node.children();
    match node.child_symbols().as_slice() {
        [
            "INT", "ID", "LPAREN", "params", "RPAREN", "LBRACE", "dcls", "statements",
            "RETURN", "expr", "SEMI", "RBRACE",
        ] => Ok(Procedure {
            name: leaf(&c[1], "ID")?.to_string(),
            params: convert_params(&c[3])?,
            body: convert_body(&c[6], &c[7], &c[9])?,
        }),
        _ => Err(malformed(node)),
    }
}

fn convert_main(node: &SyntaxTree) -> Result<Main> {
    let c = node.children();
    match node.child_symbols().as_slice() {
        [
            "INT", "WAIN", "LPAREN", "dcl", "COMMA", "dcl", "RPAREN", "LBRACE", "dcls",
            "statements", "RETURN", "expr", "SEMI", "RBRACE",
        ] => Ok(Main {
            first: convert_dcl(&c[3])?,
            second: convert_dcl(&c[5])?,
            body: convert_body(&c[8], &c[9], &c[11])?,
        }),
        _ => Err(malformed(node)),
    }
}

fn convert_body(dcls: &SyntaxTree, statements: &SyntaxTree, ret: &SyntaxTree) -> Result<Body> {
    Ok(Body {
        declarations: convert_dcls(dcls)?,
        statements: convert_statements(statements)?,
        ret: convert_expr(ret)?,
    })
}

fn convert_params(node: &SyntaxTree) -> Result<Vec<Dcl>> {
    let mut params = Vec::new();
    match (node.symbol(), node.child_symbols().as_slice()) {
        ("params", []) => return Ok(params),
        ("params", ["paramlist"]) => {}
        _ => return Err(malformed(node)),
    }

    let mut list = &node.children()[0];
    loop {
        let c = list.children();
        match (list.symbol(), list.child_symbols().as_slice()) {
            ("paramlist", ["dcl"]) => {
                params.push(convert_dcl(&c[0])?);
                return Ok(params);
            }
            ("paramlist", ["dcl", "COMMA", "paramlist"]) => {
                params.push(convert_dcl(&c[0])?);
                list = &c[2];
            }
            _ => return Err(malformed(list)),
        }
    }
}

fn convert_type(node: &SyntaxTree) -> Result<Type> {
    match (node.symbol(), node.child_symbols().as_slice()) {
        ("type", ["INT"]) => Ok(Type::Int),
        ("type", ["INT", "STAR"]) => Ok(Type::IntPointer),
        _ => Err(malformed(node)),
    }
}

fn convert_dcl(node: &SyntaxTree) -> Result<Dcl> {
    let c = node.children();
    match (node.symbol(), node.child_symbols().as_slice()) {
        ("dcl", ["type", "ID"]) => Ok(Dcl {
            ty: convert_type(&c[0])?,
            name: leaf(&c[1], "ID")?.to_string(),
        }),
        _ => Err(malformed(node)),
    }
}

/// `dcls` is left-recursive; walk the left spine and reverse
fn convert_dcls(node: &SyntaxTree) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();
    let mut current = node;
    loop {
        let c = current.children();
        let init = match (current.symbol(), current.child_symbols().as_slice()) {
            ("dcls", []) => break,
            ("dcls", ["dcls", "dcl", "BECOMES", "NUM", "SEMI"]) => Initializer::Num(number(&c[3])?),
            ("dcls", ["dcls", "dcl", "BECOMES", "NULL", "SEMI"]) => Initializer::Null,
            _ => return Err(malformed(current)),
        };
        declarations.push(Declaration {
            dcl: convert_dcl(&c[1])?,
            init,
        });
        current = &c[0];
    }
    declarations.reverse();
    Ok(declarations)
}

fn convert_statements(node: &SyntaxTree) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    let mut current = node;
    loop {
        let c = current.children();
        match (current.symbol(), current.child_symbols().as_slice()) {
            ("statements", []) => break,
            ("statements", ["statements", "statement"]) => {
                statements.push(convert_statement(&c[1])?);
                current = &c[0];
            }
            _ => return Err(malformed(current)),
        }
    }
    statements.reverse();
    Ok(statements)
}

fn convert_statement(node: &SyntaxTree) -> Result<Statement> {
    let c = node.children();
    if node.symbol() != "statement" {
        return Err(malformed(node));
    }
    match node.child_symbols().as_slice() {
        ["lvalue", "BECOMES", "expr", "SEMI"] => Ok(Statement::Assign {
            target: convert_lvalue(&c[0])?,
            value: convert_expr(&c[2])?,
        }),
        [
            "IF", "LPAREN", "test", "RPAREN", "LBRACE", "statements", "RBRACE", "ELSE",
            "LBRACE", "statements", "RBRACE",
        ] => Ok(Statement::If {
            test: convert_test(&c[2])?,
            then_branch: convert_statements(&c[5])?,
            else_branch: convert_statements(&c[9])?,
        }),
        ["WHILE", "LPAREN", "test", "RPAREN", "LBRACE", "statements", "RBRACE"] => {
            Ok(Statement::While {
                test: convert_test(&c[2])?,
                body: convert_statements(&c[5])?,
            })
        }
        ["PRINTLN", "LPAREN", "expr", "RPAREN", "SEMI"] => {
            Ok(Statement::Println(convert_expr(&c[2])?))
        }
        ["DELETE", "LBRACK", "RBRACK", "expr", "SEMI"] => {
            Ok(Statement::Delete(convert_expr(&c[3])?))
        }
        _ => Err(malformed(node)),
    }
}

fn convert_test(node: &SyntaxTree) -> Result<Test> {
    let c = node.children();
    let op = match (node.symbol(), node.child_symbols().as_slice()) {
        ("test", ["expr", "EQ", "expr"]) => CompareOp::Eq,
        ("test", ["expr", "NE", "expr"]) => CompareOp::Ne,
        ("test", ["expr", "LT", "expr"]) => CompareOp::Lt,
        ("test", ["expr", "LE", "expr"]) => CompareOp::Le,
        ("test", ["expr", "GE", "expr"]) => CompareOp::Ge,
        ("test", ["expr", "GT", "expr"]) => CompareOp::Gt,
        _ => return Err(malformed(node)),
    };
    Ok(Test {
        op,
        lhs: convert_expr(&c[0])?,
        rhs: convert_expr(&c[2])?,
    })
}

fn convert_expr(node: &SyntaxTree) -> Result<Expr> {
    let c = node.children();
    match (node.symbol(), node.child_symbols().as_slice()) {
        ("expr", ["term"]) => convert_term(&c[0]),
        ("expr", ["expr", "PLUS", "term"]) => Ok(Expr::binary(
            BinaryOp::Add,
            convert_expr(&c[0])?,
            convert_term(&c[2])?,
        )),
        ("expr", ["expr", "MINUS", "term"]) => Ok(Expr::binary(
            BinaryOp::Sub,
            convert_expr(&c[0])?,
            convert_term(&c[2])?,
        )),
        _ => Err(malformed(node)),
    }
}

fn convert_term(node: &SyntaxTree) -> Result<Expr> {
    let c = node.children();
    let op = match (node.symbol(), node.child_symbols().as_slice()) {
        ("term", ["factor"]) => return convert_factor(&c[0]),
        ("term", ["term", "STAR", "factor"]) => BinaryOp::Mul,
        ("term", ["term", "SLASH", "factor"]) => BinaryOp::Div,
        ("term", ["term", "PCT", "factor"]) => BinaryOp::Mod,
        _ => return Err(malformed(node)),
    };
    Ok(Expr::binary(op, convert_term(&c[0])?, convert_factor(&c[2])?))
}

fn convert_factor(node: &SyntaxTree) -> Result<Expr> {
    let c = node.children();
    if node.symbol() != "factor" {
        return Err(malformed(node));
    }
    match node.child_symbols().as_slice() {
        ["ID"] => Ok(Expr::Id(leaf(&c[0], "ID")?.to_string())),
        ["NUM"] => Ok(Expr::Num(number(&c[0])?)),
        ["NULL"] => Ok(Expr::Null),
        ["LPAREN", "expr", "RPAREN"] => convert_expr(&c[1]),
        ["AMP", "lvalue"] => Ok(Expr::AddressOf(Box::new(convert_lvalue(&c[1])?))),
        ["STAR", "factor"] => Ok(Expr::Deref(Box::new(convert_factor(&c[1])?))),
        ["NEW", "INT", "LBRACK", "expr", "RBRACK"] => {
            Ok(Expr::New(Box::new(convert_expr(&c[3])?)))
        }
        ["ID", "LPAREN", "RPAREN"] => Ok(Expr::Call {
            name: leaf(&c[0], "ID")?.to_string(),
            args: Vec::new(),
        }),
        ["ID", "LPAREN", "arglist", "RPAREN"] => Ok(Expr::Call {
            name: leaf(&c[0], "ID")?.to_string(),
            args: convert_arglist(&c[2])?,
        }),
        _ => Err(malformed(node)),
    }
}

fn convert_arglist(node: &SyntaxTree) -> Result<Vec<Expr>> {
    let mut args = Vec::new();
    let mut current = node;
    loop {
        let c = current.children();
        match (current.symbol(), current.child_symbols().as_slice()) {
            ("arglist", ["expr"]) => {
                args.push(convert_expr(&c[0])?);
                return Ok(args);
            }
            ("arglist", ["expr", "COMMA", "arglist"]) => {
                args.push(convert_expr(&c[0])?);
                current = &c[2];
            }
            _ => return Err(malformed(current)),
        }
    }
}

fn convert_lvalue(node: &SyntaxTree) -> Result<LValue> {
    let c = node.children();
    match (node.symbol(), node.child_symbols().as_slice()) {
        ("lvalue", ["ID"]) => Ok(LValue::Id(leaf(&c[0], "ID")?.to_string())),
        ("lvalue", ["STAR", "factor"]) => Ok(LValue::Deref(Box::new(convert_factor(&c[1])?))),
        ("lvalue", ["LPAREN", "lvalue", "RPAREN"]) => convert_lvalue(&c[1]),
        _ => Err(malformed(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lexer::Lexer;
    use crate::parser::{with_markers, Parser};
    use crate::tree::Terminal;

    fn program(source: &str) -> Program {
        let grammar = Grammar::wlp4().unwrap();
        let tokens = Lexer::new(source).tokenize().unwrap();
        let tree = Parser::new(&grammar)
            .parse(with_markers(tokens.iter().map(|t| t.to_terminal())))
            .unwrap();
        convert_program(&tree).unwrap()
    }

    #[test]
    fn test_convert_main_signature() {
        let p = program("int wain(int* a, int b) { return b; }");
        assert!(p.procedures.is_empty());
        assert_eq!(p.main.first, Dcl { ty: Type::IntPointer, name: "a".to_string() });
        assert_eq!(p.main.second.ty, Type::Int);
        assert_eq!(p.main.body.ret, Expr::Id("b".to_string()));
    }

    #[test]
    fn test_declarations_and_statements_keep_source_order() {
        let p = program(
            "int wain(int a, int b) { int x = 1; int* y = NULL; x = 2; println(x); return x; }",
        );
        let body = &p.main.body;
        assert_eq!(body.declarations.len(), 2);
        assert_eq!(body.declarations[0].init, Initializer::Num(1));
        assert_eq!(body.declarations[1].init, Initializer::Null);
        assert_eq!(body.declarations[1].dcl.name, "y");
        assert!(matches!(body.statements[0], Statement::Assign { .. }));
        assert!(matches!(body.statements[1], Statement::Println(_)));
    }

    #[test]
    fn test_expression_associativity_and_parens() {
        let p = program("int wain(int a, int b) { return a - (b - 1) * 2; }");
        let expected = Expr::binary(
            BinaryOp::Sub,
            Expr::Id("a".to_string()),
            Expr::binary(
                BinaryOp::Mul,
                Expr::binary(BinaryOp::Sub, Expr::Id("b".to_string()), Expr::Num(1)),
                Expr::Num(2),
            ),
        );
        assert_eq!(p.main.body.ret, expected);
    }

    #[test]
    fn test_procedures_and_calls() {
        let p = program(
            "int f(int x, int* y) { return x; } int g() { return 0; } \
             int wain(int a, int b) { return f(a, &b) + g(); }",
        );
        assert_eq!(p.procedures.len(), 2);
        assert_eq!(p.procedures[0].params.len(), 2);
        assert!(p.procedures[1].params.is_empty());
        let Expr::Binary { lhs, rhs, .. } = &p.main.body.ret else {
            panic!("expected a sum");
        };
        assert!(matches!(&**lhs, Expr::Call { name, args } if name == "f" && args.len() == 2));
        assert!(matches!(&**rhs, Expr::Call { name, args } if name == "g" && args.is_empty()));
    }

    #[test]
    fn test_parenthesised_lvalue_is_flattened() {
        let p = program("int wain(int* a, int b) { (*a) = b; ((b)) = 1; return b; }");
        assert!(matches!(
            &p.main.body.statements[0],
            Statement::Assign { target: LValue::Deref(_), .. }
        ));
        assert!(matches!(
            &p.main.body.statements[1],
            Statement::Assign { target: LValue::Id(name), .. } if name == "b"
        ));
    }

    #[test]
    fn test_malformed_tree_is_rejected() {
        let tree = SyntaxTree::Internal {
            symbol: "start".to_string(),
            children: vec![
                SyntaxTree::Leaf(Terminal::bof()),
                SyntaxTree::Internal {
                    symbol: "procedures".to_string(),
                    children: vec![],
                },
                SyntaxTree::Leaf(Terminal::eof()),
            ],
        };
        let err = convert_program(&tree).unwrap_err();
        assert_eq!(err, ConversionError::Malformed("procedures".to_string()));
        let compiler: CompilerError = err.into();
        assert_eq!(compiler.kind(), wlp4_common::ErrorKind::Unknown);
    }
}
