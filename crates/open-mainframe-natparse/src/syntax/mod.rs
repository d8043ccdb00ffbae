// SPDX-License-Identifier: Apache-2.0
//! Arena syntax tree.
//!
//! All nodes of a module live in one [`SyntaxTree`] and refer to each other
//! by [`NodeId`]. Parents own their children through the ordered `children`
//! list; `parent` is a plain back link. Declarations live in a second arena
//! addressed by [`VariableId`].
//!
//! Symbol references and their targets are linked both ways. Binding a
//! symbol registers it with the target ([`Variable::references`] or the
//! subroutine node's referencer list), and unbinding or removing the symbol
//! deregisters it again.

mod declaration;
mod operand;
mod statement;

pub use declaration::{
    ArrayBound, ArrayDimension, DefineData, UsingDeclaration, Variable, VariableKind,
    VariableOrigin, VariableScope,
};
pub use operand::{ArithmeticOperator, ComparisonOperator, Condition, Operand, UnaryOperator};
pub use statement::{
    ArithmeticStatementKind, DatabaseLoopKind, DecideBranch, DecideMode, EscapeKind, GetKind,
    HandlerKind, MoveKind, OutputKind, ParseKind, PrinterKind, ResizeKind, SimpleKind, Statement,
    WorkFileKind,
};

use open_mainframe_lang_core::Position;

use crate::lexer::SyntaxToken;

/// Handle of a node in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Handle of a declaration in a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub u32);

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Variable reference.
    Variable,
    /// `PERFORM` target.
    Subroutine,
    /// `CALLNAT`/`FETCH` target.
    Module,
    /// `INCLUDE` target.
    Copycode,
}

/// Target of a resolved symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A declaration in this tree.
    Variable(VariableId),
    /// A `DEFINE SUBROUTINE` statement node in this tree.
    Subroutine(NodeId),
    /// Another module, by referable name.
    Module(String),
}

/// A token that names something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReference {
    /// The name token.
    pub token: SyntaxToken,
    /// What it names.
    pub kind: SymbolKind,
    /// Resolution result.
    pub binding: Option<Binding>,
}

impl SymbolReference {
    /// Upper-case name, without quotes for module names.
    pub fn name(&self) -> String {
        self.token.string_value().to_ascii_uppercase()
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Leaf wrapping one token.
    Token(SyntaxToken),
    /// Leaf wrapping a symbol reference.
    Symbol(SymbolReference),
    /// Sequence of statements.
    StatementList,
    /// A statement.
    Statement(Statement),
    /// An operand.
    Operand(Operand),
    /// A condition.
    Condition(Condition),
    /// `(AD=... EM=...)`.
    AttributeList,
    /// `DEFINE DATA ... END-DEFINE`.
    DefineData,
    /// `LOCAL USING name`.
    Using,
    /// A scope section (`LOCAL`, `PARAMETER`, ...).
    Scope(VariableScope),
    /// One declaration line.
    Variable(VariableId),
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Payload.
    pub kind: NodeKind,
    /// Owning node.
    pub parent: Option<NodeId>,
    /// Ordered children.
    pub children: Vec<NodeId>,
    /// Symbols bound to this node (subroutine definitions).
    pub referencers: Vec<NodeId>,
    /// Detached by [`SyntaxTree::remove`].
    pub removed: bool,
}

/// Node and declaration arenas of one module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    variables: Vec<Variable>,
}

impl SyntaxTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    fn push(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in &children {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = Some(id);
            }
        }
        self.nodes.push(Node {
            kind,
            parent: None,
            children,
            referencers: Vec::new(),
            removed: false,
        });
        id
    }

    /// Add a token leaf.
    pub fn token(&mut self, token: SyntaxToken) -> NodeId {
        self.push(NodeKind::Token(token), Vec::new())
    }

    /// Add an unresolved symbol leaf.
    pub fn symbol(&mut self, token: SyntaxToken, kind: SymbolKind) -> NodeId {
        self.push(
            NodeKind::Symbol(SymbolReference {
                token,
                kind,
                binding: None,
            }),
            Vec::new(),
        )
    }

    /// Add a composite node owning `children`.
    pub fn finish(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        self.push(kind, children)
    }

    /// Append `child` to `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent.0 as usize) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(child.0 as usize) {
            node.parent = Some(parent);
        }
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent.0 as usize) {
            node.children.insert(0, child);
        }
        if let Some(node) = self.nodes.get_mut(child.0 as usize) {
            node.parent = Some(parent);
        }
    }

    /// Replace the payload of `id`.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.kind = kind;
        }
    }

    /// Current arena sizes, for [`SyntaxTree::truncate`].
    pub fn checkpoint(&self) -> (usize, usize) {
        (self.nodes.len(), self.variables.len())
    }

    /// Drop every node and declaration created after `checkpoint`.
    ///
    /// Links from surviving nodes and declarations into the dropped range
    /// are removed as well.
    pub fn truncate(&mut self, checkpoint: (usize, usize)) {
        let (nodes_len, vars_len) = checkpoint;
        self.nodes.truncate(nodes_len);
        self.variables.truncate(vars_len);
        let live = |id: &NodeId| (id.0 as usize) < nodes_len;
        for node in &mut self.nodes {
            node.children.retain(live);
            node.referencers.retain(live);
            if node.parent.is_some_and(|p| !live(&p)) {
                node.parent = None;
            }
            if let NodeKind::Symbol(symbol) = &mut node.kind {
                let dangling = match &symbol.binding {
                    Some(Binding::Variable(v)) => (v.0 as usize) >= vars_len,
                    Some(Binding::Subroutine(n)) => !live(n),
                    _ => false,
                };
                if dangling {
                    symbol.binding = None;
                }
            }
        }
        for variable in &mut self.variables {
            variable.references.retain(live);
            variable.children.retain(|c| (c.0 as usize) < vars_len);
            variable.initial_values.retain(live);
            if variable.node.is_some_and(|n| !live(&n)) {
                variable.node = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    /// Store a declaration.
    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    /// Declaration by id.
    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.0 as usize)
    }

    /// Mutable declaration by id.
    pub fn variable_mut(&mut self, id: VariableId) -> Option<&mut Variable> {
        self.variables.get_mut(id.0 as usize)
    }

    /// All declarations with their ids.
    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, v)| (VariableId(i as u32), v))
    }

    /// Number of declarations.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Payload of `id`.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// Children of `id`.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Number of nodes, including removed ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Token of a token or symbol leaf.
    pub fn leaf_token(&self, id: NodeId) -> Option<&SyntaxToken> {
        match self.kind(id)? {
            NodeKind::Token(token) => Some(token),
            NodeKind::Symbol(symbol) => Some(&symbol.token),
            _ => None,
        }
    }

    /// Symbol payload of `id`.
    pub fn symbol_ref(&self, id: NodeId) -> Option<&SymbolReference> {
        match self.kind(id)? {
            NodeKind::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Statement payload of `id`.
    pub fn statement(&self, id: NodeId) -> Option<&Statement> {
        match self.kind(id)? {
            NodeKind::Statement(statement) => Some(statement),
            _ => None,
        }
    }

    /// Operand payload of `id`.
    pub fn operand(&self, id: NodeId) -> Option<&Operand> {
        match self.kind(id)? {
            NodeKind::Operand(operand) => Some(operand),
            _ => None,
        }
    }

    /// Condition payload of `id`.
    pub fn condition(&self, id: NodeId) -> Option<&Condition> {
        match self.kind(id)? {
            NodeKind::Condition(condition) => Some(condition),
            _ => None,
        }
    }

    /// `id` and all of its descendants, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).map_or(true, |n| n.removed) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Symbol leaves under `id`.
    pub fn symbols(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| matches!(self.kind(*n), Some(NodeKind::Symbol(_))))
            .collect()
    }

    /// Tokens under `id` in order.
    pub fn tokens(&self, id: NodeId) -> Vec<&SyntaxToken> {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.leaf_token(n))
            .collect()
    }

    /// First token under `id`.
    pub fn first_token(&self, id: NodeId) -> Option<&SyntaxToken> {
        self.descendants(id).into_iter().find_map(|n| self.leaf_token(n))
    }

    /// Source text under `id`, tokens joined by a blank.
    pub fn text(&self, id: NodeId) -> String {
        self.tokens(id)
            .iter()
            .map(|t| t.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Diagnostic span of `id`: the union of its children's spans.
    ///
    /// Leaves report their token's diagnostic position. A composite node
    /// without children has no span.
    pub fn span(&self, id: NodeId) -> Option<Position> {
        if let Some(token) = self.leaf_token(id) {
            return Some(token.diagnostic_position());
        }
        self.children(id)
            .iter()
            .filter_map(|c| self.span(*c))
            .reduce(Position::union)
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    /// Bind the symbol `symbol` and register it with the target.
    pub fn bind(&mut self, symbol: NodeId, binding: Binding) {
        self.unbind(symbol);
        match &binding {
            Binding::Variable(v) => {
                if let Some(variable) = self.variables.get_mut(v.0 as usize) {
                    variable.references.push(symbol);
                }
            }
            Binding::Subroutine(n) => {
                if let Some(node) = self.nodes.get_mut(n.0 as usize) {
                    node.referencers.push(symbol);
                }
            }
            Binding::Module(_) => {}
        }
        if let Some(Node {
            kind: NodeKind::Symbol(reference),
            ..
        }) = self.nodes.get_mut(symbol.0 as usize)
        {
            reference.binding = Some(binding);
        }
    }

    /// Clear the binding of `symbol` and deregister it from its target.
    pub fn unbind(&mut self, symbol: NodeId) {
        let previous = match self.nodes.get_mut(symbol.0 as usize) {
            Some(Node {
                kind: NodeKind::Symbol(reference),
                ..
            }) => reference.binding.take(),
            _ => None,
        };
        match previous {
            Some(Binding::Variable(v)) => {
                if let Some(variable) = self.variables.get_mut(v.0 as usize) {
                    variable.references.retain(|r| *r != symbol);
                }
            }
            Some(Binding::Subroutine(n)) => {
                if let Some(node) = self.nodes.get_mut(n.0 as usize) {
                    node.referencers.retain(|r| *r != symbol);
                }
            }
            _ => {}
        }
    }

    /// Binding of a symbol leaf.
    pub fn binding(&self, symbol: NodeId) -> Option<&Binding> {
        self.symbol_ref(symbol).and_then(|s| s.binding.as_ref())
    }

    /// Symbols bound to a subroutine definition node.
    pub fn referencers(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|n| n.referencers.as_slice())
            .unwrap_or_default()
    }

    /// Detach `id` from its parent and mark its subtree removed, unbinding
    /// every symbol inside it.
    pub fn remove(&mut self, id: NodeId) {
        for symbol in self.symbols(id) {
            self.unbind(symbol);
        }
        for node in self.descendants(id) {
            if let Some(n) = self.nodes.get_mut(node.0 as usize) {
                n.removed = true;
            }
        }
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.nodes.get_mut(parent.0 as usize) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(n) = self.nodes.get_mut(id.0 as usize) {
            n.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;
    use open_mainframe_lang_core::Span;

    fn token(text: &str, offset: u32) -> SyntaxToken {
        let end = offset + text.len() as u32;
        SyntaxToken::new(TokenKind::Identifier, text, Position::new(Span::main(offset, end), 0, offset))
    }

    fn sample() -> (SyntaxTree, NodeId, NodeId, VariableId) {
        let mut tree = SyntaxTree::new();
        let var = tree.add_variable(Variable::new("#X", 1, VariableScope::Local, Position::default()));
        let sym = tree.symbol(token("#X", 0), SymbolKind::Variable);
        let reference = tree.finish(
            NodeKind::Operand(Operand::Reference {
                symbol: sym,
                indices: Vec::new(),
            }),
            vec![sym],
        );
        let assign = tree.token(token(":=", 3));
        let value = tree.token(token("'A'", 6));
        let stmt = tree.finish(
            NodeKind::Statement(Statement::Assign {
                target: reference,
                value,
                rounded: false,
            }),
            vec![reference, assign, value],
        );
        (tree, stmt, sym, var)
    }

    #[test]
    fn test_span_is_union_of_children() {
        let (tree, stmt, _, _) = sample();
        let span = tree.span(stmt).map(|p| (p.offset(), p.end()));
        assert_eq!(span, Some((0, 9)));
        for child in tree.children(stmt) {
            let c = tree.span(*child).map(|p| (p.offset(), p.end()));
            let (start, end) = c.unwrap_or_default();
            assert!(start < end && end <= 9);
        }
        let empty = {
            let mut t = SyntaxTree::new();
            let id = t.finish(NodeKind::StatementList, Vec::new());
            t.span(id)
        };
        assert!(empty.is_none());
    }

    #[test]
    fn test_parent_links() {
        let (tree, stmt, sym, _) = sample();
        let reference = tree.parent(sym);
        assert!(reference.is_some());
        assert_eq!(reference.and_then(|r| tree.parent(r)), Some(stmt));
    }

    #[test]
    fn test_bind_and_remove_are_symmetric() {
        let (mut tree, stmt, sym, var) = sample();
        tree.bind(sym, Binding::Variable(var));
        assert_eq!(tree.variable(var).map(|v| v.references.clone()), Some(vec![sym]));
        assert_eq!(tree.binding(sym), Some(&Binding::Variable(var)));

        tree.bind(sym, Binding::Variable(var));
        assert_eq!(tree.variable(var).map(|v| v.references.len()), Some(1));

        tree.remove(stmt);
        assert_eq!(tree.variable(var).map(|v| v.references.len()), Some(0));
        assert!(tree.binding(sym).is_none());
        assert!(tree.descendants(stmt).is_empty());
    }

    #[test]
    fn test_subroutine_referencers() {
        let mut tree = SyntaxTree::new();
        let def = tree.finish(NodeKind::StatementList, Vec::new());
        let sym = tree.symbol(token("SUB", 0), SymbolKind::Subroutine);
        tree.bind(sym, Binding::Subroutine(def));
        assert_eq!(tree.referencers(def), &[sym]);
        tree.unbind(sym);
        assert!(tree.referencers(def).is_empty());
    }

    #[test]
    fn test_truncate_drops_links() {
        let (mut tree, _, _, var) = sample();
        let checkpoint = tree.checkpoint();
        let sym = tree.symbol(token("#X", 10), SymbolKind::Variable);
        tree.bind(sym, Binding::Variable(var));
        tree.add_variable(Variable::new("#Y", 1, VariableScope::Local, Position::default()));
        tree.truncate(checkpoint);
        assert_eq!(tree.len(), checkpoint.0);
        assert_eq!(tree.variable_count(), 1);
        assert!(tree.variable(var).is_some_and(|v| v.references.is_empty()));
    }

    #[test]
    fn test_text_and_tokens() {
        let (tree, stmt, _, _) = sample();
        assert_eq!(tree.text(stmt), "#X := 'A'");
        assert_eq!(tree.first_token(stmt).map(|t| t.text()), Some("#X"));
    }
}
