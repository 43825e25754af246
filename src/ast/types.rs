//! Abstract Syntax Tree (AST) Types for posish
//!
//! This module defines the tree the parser builds for one input unit.
//! The whole unit is parsed before anything runs, and the tree is never
//! mutated afterwards; function bodies are shared out of it by `Rc`.

use std::fmt;

// =============================================================================
// SCRIPT & STATEMENTS
// =============================================================================

/// Root node: a complete script (a sequential list)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptNode {
    pub statements: Vec<StatementNode>,
}

/// An AND-OR list of pipelines, optionally run in the background
#[derive(Debug, Clone, PartialEq)]
pub struct StatementNode {
    pub pipelines: Vec<PipelineNode>,
    /// Operators between pipelines; `operators.len() == pipelines.len() - 1`
    pub operators: Vec<StatementOperator>,
    /// Terminated by `&`
    pub background: bool,
    /// Line the statement starts on
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOperator {
    And, // &&
    Or,  // ||
}

// =============================================================================
// PIPELINES & COMMANDS
// =============================================================================

/// A pipeline: cmd1 | cmd2 | cmd3
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineNode {
    pub commands: Vec<CommandNode>,
    /// Negate exit status with !
    pub negated: bool,
}

/// Union of all command types
#[derive(Debug, Clone, PartialEq)]
pub enum CommandNode {
    Simple(SimpleCommandNode),
    Compound(CompoundCommandNode),
    FunctionDef(FunctionDefNode),
}

/// Simple command: name args... with optional redirections
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCommandNode {
    /// Variable assignments before command: VAR=value cmd
    pub assignments: Vec<AssignmentNode>,
    /// Command name (None for assignment- or redirection-only commands)
    pub name: Option<WordNode>,
    pub args: Vec<WordNode>,
    pub redirections: Vec<RedirectionNode>,
    pub line: usize,
}

/// Compound commands: control structures
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundCommandNode {
    If(IfNode),
    For(ForNode),
    While(WhileNode),
    Until(UntilNode),
    Case(CaseNode),
    Subshell(SubshellNode),
    Group(GroupNode),
}

impl CompoundCommandNode {
    /// Redirections trailing the compound command
    pub fn redirections(&self) -> &[RedirectionNode] {
        match self {
            Self::If(n) => &n.redirections,
            Self::For(n) => &n.redirections,
            Self::While(n) => &n.redirections,
            Self::Until(n) => &n.redirections,
            Self::Case(n) => &n.redirections,
            Self::Subshell(n) => &n.redirections,
            Self::Group(n) => &n.redirections,
        }
    }
}

// =============================================================================
// CONTROL FLOW
// =============================================================================

/// if statement
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    /// The `if` clause followed by every `elif` clause
    pub clauses: Vec<IfClause>,
    pub else_body: Option<Vec<StatementNode>>,
    pub redirections: Vec<RedirectionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: Vec<StatementNode>,
    pub body: Vec<StatementNode>,
}

/// for loop: for VAR in WORDS; do ...; done
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub variable: String,
    /// Words to iterate over (None = "$@")
    pub words: Option<Vec<WordNode>>,
    pub body: Vec<StatementNode>,
    pub redirections: Vec<RedirectionNode>,
}

/// while loop
#[derive(Debug, Clone, PartialEq)]
pub struct WhileNode {
    pub condition: Vec<StatementNode>,
    pub body: Vec<StatementNode>,
    pub redirections: Vec<RedirectionNode>,
}

/// until loop
#[derive(Debug, Clone, PartialEq)]
pub struct UntilNode {
    pub condition: Vec<StatementNode>,
    pub body: Vec<StatementNode>,
    pub redirections: Vec<RedirectionNode>,
}

/// case statement
#[derive(Debug, Clone, PartialEq)]
pub struct CaseNode {
    pub word: WordNode,
    pub items: Vec<CaseItemNode>,
    pub redirections: Vec<RedirectionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseItemNode {
    pub patterns: Vec<WordNode>,
    pub body: Vec<StatementNode>,
}

/// Subshell: ( ... )
#[derive(Debug, Clone, PartialEq)]
pub struct SubshellNode {
    pub body: Vec<StatementNode>,
    pub redirections: Vec<RedirectionNode>,
}

/// Command group: { ...; }
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub body: Vec<StatementNode>,
    pub redirections: Vec<RedirectionNode>,
}

// =============================================================================
// FUNCTIONS
// =============================================================================

/// Function definition: name() compound-command
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefNode {
    pub name: String,
    pub body: Box<CompoundCommandNode>,
}

// =============================================================================
// ASSIGNMENTS
// =============================================================================

/// Variable assignment: VAR=value
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentNode {
    pub name: String,
    /// None for `VAR=` (empty value)
    pub value: Option<WordNode>,
}

// =============================================================================
// REDIRECTIONS
// =============================================================================

/// I/O redirection
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectionNode {
    /// Explicit descriptor (`2>`); None means the operator's default
    pub fd: Option<i32>,
    pub operator: RedirectionOperator,
    pub target: RedirectionTarget,
}

impl RedirectionNode {
    /// The descriptor this redirection rewires
    pub fn target_fd(&self) -> i32 {
        self.fd.unwrap_or_else(|| self.operator.default_fd())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedirectionTarget {
    Word(WordNode),
    HereDoc(HereDocNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectionOperator {
    Less,      // <
    Great,     // >
    DGreat,    // >>
    GreatAnd,  // >&
    LessAnd,   // <&
    LessGreat, // <>
    Clobber,   // >|
    DLess,     // <<
    DLessDash, // <<-
}

impl RedirectionOperator {
    pub fn default_fd(&self) -> i32 {
        match self {
            Self::Less | Self::LessAnd | Self::LessGreat | Self::DLess | Self::DLessDash => 0,
            Self::Great | Self::DGreat | Self::GreatAnd | Self::Clobber => 1,
        }
    }
}

impl fmt::Display for RedirectionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Less => write!(f, "<"),
            Self::Great => write!(f, ">"),
            Self::DGreat => write!(f, ">>"),
            Self::GreatAnd => write!(f, ">&"),
            Self::LessAnd => write!(f, "<&"),
            Self::LessGreat => write!(f, "<>"),
            Self::Clobber => write!(f, ">|"),
            Self::DLess => write!(f, "<<"),
            Self::DLessDash => write!(f, "<<-"),
        }
    }
}

/// Here document
#[derive(Debug, Clone, PartialEq)]
pub struct HereDocNode {
    pub delimiter: String,
    pub content: WordNode,
    /// Strip leading tabs (<<- vs <<)
    pub strip_tabs: bool,
    /// Quoted delimiter means no expansion
    pub quoted: bool,
}

// =============================================================================
// WORDS (the heart of shell parsing)
// =============================================================================

/// A Word is a sequence of parts that form a single shell word.
/// Quoting is recorded per part, never for the word as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WordNode {
    pub parts: Vec<WordPart>,
}

impl WordNode {
    /// The word's text when it consists only of unquoted literal parts.
    /// Alias lookup and function names use this.
    pub fn literal_text(&self) -> Option<String> {
        let mut text = String::new();
        for part in &self.parts {
            match part {
                WordPart::Literal(s) => text.push_str(s),
                _ => return None,
            }
        }
        Some(text)
    }

    /// True when any part carries quoting
    pub fn has_quotes(&self) -> bool {
        self.parts.iter().any(|p| {
            matches!(
                p,
                WordPart::SingleQuoted(_) | WordPart::DoubleQuoted(_) | WordPart::Escaped(_)
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordPart {
    /// Unquoted literal text
    Literal(String),
    /// '...' text, never expanded
    SingleQuoted(String),
    /// "..." contents, expanded but not split or globbed
    DoubleQuoted(Vec<WordPart>),
    /// Backslash-escaped character(s)
    Escaped(String),
    ParameterExpansion(ParameterExpansionPart),
    CommandSubstitution(CommandSubstitutionPart),
    ArithmeticExpansion(ArithmeticExpansionPart),
    /// Unquoted pattern characters: `*`, `?`, `[...]`
    Glob(String),
    /// Leading `~` or `~user`
    TildeExpansion(Option<String>),
}

/// $name, ${name}, ${name op word}
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterExpansionPart {
    pub parameter: String,
    pub operation: Option<ParameterOperation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterOperation {
    /// ${v:-w} / ${v-w}
    DefaultValue { word: WordNode, check_empty: bool },
    /// ${v:=w} / ${v=w}
    AssignDefault { word: WordNode, check_empty: bool },
    /// ${v:+w} / ${v+w}
    UseAlternative { word: WordNode, check_empty: bool },
    /// ${v:?w} / ${v?w}
    ErrorIfUnset { word: Option<WordNode>, check_empty: bool },
    /// ${#v}
    Length,
    /// ${v#p} ${v##p} ${v%p} ${v%%p}
    PatternRemoval {
        pattern: WordNode,
        side: PatternRemovalSide,
        greedy: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRemovalSide {
    Prefix, // # and ##
    Suffix, // % and %%
}

/// $(...) or `...`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSubstitutionPart {
    pub body: ScriptNode,
    /// Backtick form
    pub legacy: bool,
}

/// $(( ... )). The expression text is expanded first, then parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticExpansionPart {
    pub expression: WordNode,
}

// =============================================================================
// ARITHMETIC EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ArithExpr {
    Number(i64),
    Variable(String),
    Unary {
        op: ArithUnaryOp,
        operand: Box<ArithExpr>,
    },
    Binary {
        op: ArithBinaryOp,
        left: Box<ArithExpr>,
        right: Box<ArithExpr>,
    },
    Ternary {
        condition: Box<ArithExpr>,
        then_branch: Box<ArithExpr>,
        else_branch: Box<ArithExpr>,
    },
    Assignment {
        op: ArithAssignOp,
        name: String,
        value: Box<ArithExpr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithUnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithAssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

// =============================================================================
// AST FACTORY
// =============================================================================

/// Small constructors used by the parser and by tests
pub struct AST;

impl AST {
    pub fn script(statements: Vec<StatementNode>) -> ScriptNode {
        ScriptNode { statements }
    }

    pub fn statement(
        pipelines: Vec<PipelineNode>,
        operators: Vec<StatementOperator>,
        background: bool,
        line: usize,
    ) -> StatementNode {
        StatementNode {
            pipelines,
            operators,
            background,
            line,
        }
    }

    pub fn pipeline(commands: Vec<CommandNode>, negated: bool) -> PipelineNode {
        PipelineNode { commands, negated }
    }

    pub fn word(parts: Vec<WordPart>) -> WordNode {
        WordNode { parts }
    }

    pub fn literal(value: impl Into<String>) -> WordPart {
        WordPart::Literal(value.into())
    }

    pub fn parameter(name: impl Into<String>) -> WordPart {
        WordPart::ParameterExpansion(ParameterExpansionPart {
            parameter: name.into(),
            operation: None,
        })
    }
}
