// SPDX-License-Identifier: Apache-2.0
//! Statement nodes.
//!
//! Every statement is a [`Statement`] variant stored in a
//! [`NodeKind::Statement`](super::NodeKind::Statement) node. The node's
//! children are all of the statement's tokens and sub-nodes in source
//! order; the variant fields point at the children that carry meaning.

use super::NodeId;

/// `FIRST` or `EVERY` for DECIDE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecideMode {
    First,
    Every,
}

/// One `VALUE`/`CONDITION` branch of a DECIDE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecideBranch {
    /// `WHEN` values (DECIDE ON); empty for DECIDE FOR.
    pub values: Vec<NodeId>,
    /// `WHEN` condition (DECIDE FOR).
    pub condition: Option<NodeId>,
    /// Branch body.
    pub body: NodeId,
}

/// `ESCAPE` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Top,
    Bottom,
    Routine,
    Module,
}

/// Looping database statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseLoopKind {
    Read,
    Find,
    Histogram,
}

/// `GET` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetKind {
    /// `GET view isn`.
    Record,
    /// `GET SAME`.
    Same,
    /// `GET TRANSACTION DATA`.
    Transaction,
}

/// `MOVE` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Plain,
    All,
    ByName,
    ByPosition,
    Edited,
    LeftJustified,
    RightJustified,
}

/// Arithmetic statement verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticStatementKind {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// `EXPAND`, `RESIZE` or `REDUCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeKind {
    Expand,
    Resize,
    Reduce,
}

/// Report output verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Write,
    Display,
    Print,
}

/// Work file statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkFileKind {
    Read,
    Write,
    Close,
    Define,
}

/// Printer statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterKind {
    Define,
    Close,
}

/// `PARSE JSON` or `PARSE XML`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseKind {
    Json,
    Xml,
}

/// Event handler blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    OnError,
    AtEndOfData,
    AtEndOfFile,
    AtStartOfData,
    AtBreak,
    BeforeBreak,
    AtTopOfPage,
    AtEndOfPage,
}

/// Statements without operands of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleKind {
    Stop,
    Terminate,
    Ignore,
    Retry,
    Eject,
    Newpage,
    Skip,
    Format,
    EndTransaction,
    Backout,
    SetControl,
    SetKey,
}

/// A statement node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `target := value`, `ASSIGN`, `COMPUTE`.
    Assign {
        target: NodeId,
        value: NodeId,
        rounded: bool,
    },
    /// `IF ... [ELSE ...] END-IF`.
    If {
        condition: NodeId,
        body: NodeId,
        else_body: Option<NodeId>,
    },
    /// `IF NO RECORDS FOUND ... END-NOREC`.
    NoRecordsFound { body: NodeId },
    /// `DECIDE ON FIRST|EVERY [VALUE [OF]] operand`.
    DecideOn {
        mode: DecideMode,
        operand: NodeId,
        branches: Vec<DecideBranch>,
        any_body: Option<NodeId>,
        all_body: Option<NodeId>,
        none_body: Option<NodeId>,
    },
    /// `DECIDE FOR FIRST|EVERY CONDITION`.
    DecideFor {
        mode: DecideMode,
        branches: Vec<DecideBranch>,
        any_body: Option<NodeId>,
        all_body: Option<NodeId>,
        none_body: Option<NodeId>,
    },
    /// `FOR counter [:=|=|FROM] from [TO] to [STEP step]`.
    For {
        counter: NodeId,
        from: NodeId,
        to: NodeId,
        step: Option<NodeId>,
        body: NodeId,
    },
    /// `REPEAT [UNTIL|WHILE cond] ... END-REPEAT`.
    Repeat {
        condition: Option<NodeId>,
        body: NodeId,
    },
    /// `ESCAPE TOP|BOTTOM|ROUTINE|MODULE`.
    Escape { kind: EscapeKind },
    /// `READ`, `FIND`, `HISTOGRAM` with a loop body.
    DatabaseLoop {
        kind: DatabaseLoopKind,
        view: Option<NodeId>,
        descriptor: Option<NodeId>,
        condition: Option<NodeId>,
        body: Option<NodeId>,
    },
    /// `FIND NUMBER view WITH ...`.
    FindNumber {
        view: Option<NodeId>,
        condition: Option<NodeId>,
    },
    /// `GET`.
    Get {
        kind: GetKind,
        view: Option<NodeId>,
        operands: Vec<NodeId>,
    },
    /// `STORE [RECORD] [IN] view`.
    Store { view: Option<NodeId> },
    /// `UPDATE [RECORD] [(label)]`.
    Update { label: Option<NodeId> },
    /// `DELETE [RECORD] [(label)]`.
    Delete { label: Option<NodeId> },
    /// `CALLNAT name params`.
    Callnat {
        module: NodeId,
        parameters: Vec<NodeId>,
    },
    /// `FETCH [RETURN] name params`.
    Fetch {
        module: NodeId,
        parameters: Vec<NodeId>,
        returns: bool,
    },
    /// `PERFORM name params`.
    Perform {
        subroutine: NodeId,
        parameters: Vec<NodeId>,
    },
    /// `INCLUDE name params` with the expanded copy code body.
    Include {
        name: NodeId,
        parameters: Vec<NodeId>,
        body: Option<NodeId>,
    },
    /// `DEFINE SUBROUTINE name ... END-SUBROUTINE`.
    Subroutine { name: NodeId, body: NodeId },
    /// `CALL 'program' params`.
    Call {
        program: NodeId,
        parameters: Vec<NodeId>,
    },
    /// `RUN [REPEAT] program`.
    Run { program: NodeId },
    /// `STACK [TOP] [DATA|COMMAND] operands`.
    Stack { operands: Vec<NodeId> },
    /// `COMPRESS operands INTO target`.
    Compress {
        operands: Vec<NodeId>,
        target: NodeId,
        numeric: bool,
        leaving_no_space: bool,
    },
    /// `MOVE source TO targets`.
    Move {
        kind: MoveKind,
        source: NodeId,
        targets: Vec<NodeId>,
        rounded: bool,
    },
    /// `ADD`, `SUBTRACT`, `MULTIPLY`, `DIVIDE`.
    Arithmetic {
        kind: ArithmeticStatementKind,
        rounded: bool,
        operands: Vec<NodeId>,
        target: Option<NodeId>,
        giving: Option<NodeId>,
        remainder: Option<NodeId>,
    },
    /// `EXAMINE`.
    Examine {
        operand: NodeId,
        pattern: Option<NodeId>,
        replacement: Option<NodeId>,
        giving: Vec<NodeId>,
    },
    /// `SEPARATE source INTO targets`.
    Separate {
        source: NodeId,
        targets: Vec<NodeId>,
        giving_number: Option<NodeId>,
    },
    /// `RESET [INITIAL] targets`.
    Reset { initial: bool, targets: Vec<NodeId> },
    /// `EXPAND|RESIZE|REDUCE [DYNAMIC] [VARIABLE|ARRAY] operand TO ...`.
    ArrayResize {
        kind: ResizeKind,
        operand: NodeId,
        bounds: Vec<NodeId>,
        giving: Option<NodeId>,
    },
    /// `WRITE`, `DISPLAY`, `PRINT`.
    Output {
        kind: OutputKind,
        report: Option<NodeId>,
        operands: Vec<NodeId>,
    },
    /// `INPUT`.
    Input { operands: Vec<NodeId> },
    /// `REINPUT [FULL] operands [MARK ...]`.
    Reinput { operands: Vec<NodeId> },
    /// Work file access.
    WorkFile {
        kind: WorkFileKind,
        number: Option<NodeId>,
        operands: Vec<NodeId>,
        body: Option<NodeId>,
    },
    /// Printer definition.
    Printer { kind: PrinterKind, name: Option<NodeId> },
    /// `PARSE JSON|XML source INTO targets ... END-PARSE`.
    Parse {
        kind: ParseKind,
        source: NodeId,
        targets: Vec<NodeId>,
        body: NodeId,
    },
    /// `ON ERROR`, `AT END OF DATA`, `AT BREAK`, ...
    Handler {
        kind: HandlerKind,
        operand: Option<NodeId>,
        body: NodeId,
    },
    /// Statement whose operands are kept only as children.
    Simple { kind: SimpleKind },
    /// `END` / `.`.
    End,
}

impl Statement {
    /// Operands the statement writes to.
    pub fn mutated_operands(&self) -> Vec<NodeId> {
        match self {
            Statement::Assign { target, .. } => vec![*target],
            Statement::For { counter, .. } => vec![*counter],
            Statement::Get {
                kind: GetKind::Transaction,
                operands,
                ..
            } => operands.clone(),
            Statement::Compress { target, .. } => vec![*target],
            Statement::Move { targets, .. } => targets.clone(),
            Statement::Arithmetic {
                target,
                giving,
                remainder,
                ..
            } => {
                // with GIVING the target operand is only read
                let written = if giving.is_some() { giving } else { target };
                written.iter().chain(remainder.iter()).copied().collect()
            }
            Statement::Examine { giving, .. } => giving.clone(),
            Statement::Separate {
                targets,
                giving_number,
                ..
            } => targets.iter().chain(giving_number.iter()).copied().collect(),
            Statement::Reset { targets, .. } => targets.clone(),
            Statement::Input { operands } => operands.clone(),
            Statement::Parse { targets, .. } => targets.clone(),
            Statement::WorkFile {
                kind: WorkFileKind::Read,
                operands,
                ..
            } => operands.clone(),
            _ => Vec::new(),
        }
    }

    /// Nested statement lists owned by the statement.
    pub fn bodies(&self) -> Vec<NodeId> {
        match self {
            Statement::If {
                body, else_body, ..
            } => std::iter::once(*body).chain(else_body.iter().copied()).collect(),
            Statement::NoRecordsFound { body }
            | Statement::For { body, .. }
            | Statement::Repeat { body, .. }
            | Statement::Subroutine { body, .. }
            | Statement::Parse { body, .. }
            | Statement::Handler { body, .. } => vec![*body],
            Statement::DecideOn {
                branches,
                any_body,
                all_body,
                none_body,
                ..
            }
            | Statement::DecideFor {
                branches,
                any_body,
                all_body,
                none_body,
                ..
            } => branches
                .iter()
                .map(|b| b.body)
                .chain(any_body.iter().copied())
                .chain(all_body.iter().copied())
                .chain(none_body.iter().copied())
                .collect(),
            Statement::DatabaseLoop { body, .. }
            | Statement::WorkFile { body, .. }
            | Statement::Include { body, .. } => body.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutated_operands_with_giving() {
        let add = Statement::Arithmetic {
            kind: ArithmeticStatementKind::Add,
            rounded: false,
            operands: vec![NodeId(1)],
            target: Some(NodeId(2)),
            giving: Some(NodeId(3)),
            remainder: None,
        };
        assert_eq!(add.mutated_operands(), vec![NodeId(3)]);

        let divide = Statement::Arithmetic {
            kind: ArithmeticStatementKind::Divide,
            rounded: false,
            operands: vec![NodeId(1)],
            target: Some(NodeId(2)),
            giving: None,
            remainder: Some(NodeId(4)),
        };
        assert_eq!(divide.mutated_operands(), vec![NodeId(2), NodeId(4)]);
    }

    #[test]
    fn test_bodies() {
        let stmt = Statement::If {
            condition: NodeId(0),
            body: NodeId(1),
            else_body: Some(NodeId(2)),
        };
        assert_eq!(stmt.bodies(), vec![NodeId(1), NodeId(2)]);
        assert!(Statement::End.bodies().is_empty());
    }
}
