// SPDX-License-Identifier: Apache-2.0
//! Macro definitions for generating Natural keyword, statement and
//! diagnostic boilerplate.
//!
//! These callback-style macros define the master lists. Each consumer module
//! provides its own processing macro to generate the code it needs (enum
//! definitions, lookup tables, dispatch chains).
//!
//! # Adding a new keyword
//!
//! Add one line to [`for_all_keywords!`]: `@hard` for words that can never
//! name a variable, `@soft` for words that are keywords only where the
//! grammar expects them (`NAME`, `VALUE`, `TOP`, ...).
//!
//! # Adding a new statement
//!
//! 1. Add the keyword (if new) to [`for_all_keywords!`].
//! 2. Add one line to [`for_parse_dispatch!`] with the parse function name.
//! 3. Add the variant to `syntax::Statement` and write the parse function in
//!    the matching `parser/*.rs` file.
//!
//! The statement dispatch and `is_statement_start()` are generated.

// ═══════════════════════════════════════════════════════════════════════════
// KEYWORD DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Master keyword definition table.
///
/// Invokes `$mac` with all Natural keywords in two groups:
///
/// - `@hard`: reserved words. The lexer classifies them as keywords and the
///   parser never accepts them as operands.
/// - `@soft`: identifier-or-keyword. The lexer still classifies them as
///   keywords but the parser accepts them wherever a variable name fits.
macro_rules! for_all_keywords {
    ($mac:ident) => {
        $mac! {
            @hard {
                // ── Statements ──────────────────────────────────────────
                Add             => "ADD",
                Assign          => "ASSIGN",
                At              => "AT",
                Backout         => "BACKOUT",
                Before          => "BEFORE",
                Call            => "CALL",
                Callnat         => "CALLNAT",
                Close           => "CLOSE",
                Compress        => "COMPRESS",
                Compute         => "COMPUTE",
                Decide          => "DECIDE",
                Define          => "DEFINE",
                Delete          => "DELETE",
                Display         => "DISPLAY",
                Divide          => "DIVIDE",
                Eject           => "EJECT",
                End             => "END",
                Escape          => "ESCAPE",
                Examine         => "EXAMINE",
                Expand          => "EXPAND",
                Fetch           => "FETCH",
                Find            => "FIND",
                For             => "FOR",
                Format          => "FORMAT",
                Get             => "GET",
                Histogram       => "HISTOGRAM",
                If              => "IF",
                Ignore          => "IGNORE",
                Include         => "INCLUDE",
                Input           => "INPUT",
                Move            => "MOVE",
                Multiply        => "MULTIPLY",
                Newpage         => "NEWPAGE",
                On              => "ON",
                Parse           => "PARSE",
                Perform         => "PERFORM",
                Print           => "PRINT",
                Read            => "READ",
                Reduce          => "REDUCE",
                Reinput         => "REINPUT",
                Repeat          => "REPEAT",
                Reset           => "RESET",
                Resize          => "RESIZE",
                Retry           => "RETRY",
                Run             => "RUN",
                Separate        => "SEPARATE",
                Set             => "SET",
                Skip            => "SKIP",
                Stack           => "STACK",
                Stop            => "STOP",
                Store           => "STORE",
                Subtract        => "SUBTRACT",
                Terminate       => "TERMINATE",
                Update          => "UPDATE",
                Write           => "WRITE",

                // ── Block structure ─────────────────────────────────────
                Else            => "ELSE",
                When            => "WHEN",
                Until           => "UNTIL",
                While           => "WHILE",
                EndDefine       => "END-DEFINE",
                EndIf           => "END-IF",
                EndDecide       => "END-DECIDE",
                EndFor          => "END-FOR",
                EndRepeat       => "END-REPEAT",
                EndRead         => "END-READ",
                EndFind         => "END-FIND",
                EndHistogram    => "END-HISTOGRAM",
                EndSubroutine   => "END-SUBROUTINE",
                EndWork         => "END-WORK",
                EndParse        => "END-PARSE",
                EndError        => "END-ERROR",
                EndNorec        => "END-NOREC",
                EndEnddata      => "END-ENDDATA",
                EndEndfile      => "END-ENDFILE",
                EndStart        => "END-START",
                EndBreak        => "END-BREAK",
                EndBefore       => "END-BEFORE",
                EndToppage      => "END-TOPPAGE",
                EndEndpage      => "END-ENDPAGE",

                // ── Logical operators ───────────────────────────────────
                And             => "AND",
                Or              => "OR",
                Not             => "NOT",
                Thru            => "THRU",
            }
            @soft {
                // ── DEFINE DATA ─────────────────────────────────────────
                Data            => "DATA",
                Local           => "LOCAL",
                Parameter       => "PARAMETER",
                Global          => "GLOBAL",
                Independent     => "INDEPENDENT",
                Using           => "USING",
                View            => "VIEW",
                Of              => "OF",
                Redefine        => "REDEFINE",
                Init            => "INIT",
                Const           => "CONST",
                Constant        => "CONSTANT",
                Dynamic         => "DYNAMIC",
                Optional        => "OPTIONAL",
                By              => "BY",
                Result          => "RESULT",
                Full            => "FULL",
                Length          => "LENGTH",
                Filler          => "FILLER",

                // ── Clauses ─────────────────────────────────────────────
                Value           => "VALUE",
                Values          => "VALUES",
                First           => "FIRST",
                Every           => "EVERY",
                Any             => "ANY",
                All             => "ALL",
                None            => "NONE",
                Condition       => "CONDITION",
                Then            => "THEN",
                To              => "TO",
                From            => "FROM",
                Step            => "STEP",
                Giving          => "GIVING",
                Remainder       => "REMAINDER",
                Rounded         => "ROUNDED",
                Into            => "INTO",
                With            => "WITH",
                Where           => "WHERE",
                Subroutine      => "SUBROUTINE",
                Transaction     => "TRANSACTION",
                Number          => "NUMBER",
                Unique          => "UNIQUE",
                Same            => "SAME",
                Record          => "RECORD",
                Records         => "RECORDS",
                Found           => "FOUND",
                No              => "NO",
                Starting        => "STARTING",
                Ending          => "ENDING",
                Sorted          => "SORTED",
                In              => "IN",
                Physical        => "PHYSICAL",
                Logical         => "LOGICAL",
                Sequence        => "SEQUENCE",
                Ascending       => "ASCENDING",
                Descending      => "DESCENDING",
                Isn             => "ISN",
                Delimiter       => "DELIMITER",
                Delimiters      => "DELIMITERS",
                Leaving         => "LEAVING",
                Space           => "SPACE",
                Numeric         => "NUMERIC",
                Edited          => "EDITED",
                Name            => "NAME",
                Position        => "POSITION",
                Left            => "LEFT",
                Right           => "RIGHT",
                Justified       => "JUSTIFIED",
                Initial         => "INITIAL",
                Array           => "ARRAY",
                Size            => "SIZE",
                Variable        => "VARIABLE",
                Occurrences     => "OCCURRENCES",
                Work            => "WORK",
                File            => "FILE",
                Once            => "ONCE",
                Printer         => "PRINTER",
                Output          => "OUTPUT",
                Error           => "ERROR",
                Start           => "START",
                Break           => "BREAK",
                Processing      => "PROCESSING",
                Page            => "PAGE",
                Top             => "TOP",
                Bottom          => "BOTTOM",
                Routine         => "ROUTINE",
                Module          => "MODULE",
                Immediate       => "IMMEDIATE",
                Reposition      => "REPOSITION",
                Return          => "RETURN",
                Json            => "JSON",
                Xml             => "XML",
                Path            => "PATH",
                Subcode         => "SUBCODE",
                Key             => "KEY",
                Control         => "CONTROL",
                Notitle         => "NOTITLE",
                Nohdr           => "NOHDR",
                Mark            => "MARK",
                Map             => "MAP",
                Erase           => "ERASE",
                Lines           => "LINES",
                Pattern         => "PATTERN",
                Direction       => "DIRECTION",
                Replace         => "REPLACE",
                Retained        => "RETAINED",
                Index           => "INDEX",
                Command         => "COMMAND",
                Formatted       => "FORMATTED",
                Type            => "TYPE",

                // ── Conditions ──────────────────────────────────────────
                Eq              => "EQ",
                Ne              => "NE",
                Lt              => "LT",
                Le              => "LE",
                Gt              => "GT",
                Ge              => "GE",
                Equal           => "EQUAL",
                Less            => "LESS",
                Greater         => "GREATER",
                Than            => "THAN",
                Is              => "IS",
                Mask            => "MASK",
                Scan            => "SCAN",
                Modified        => "MODIFIED",
                Specified       => "SPECIFIED",
                But             => "BUT",

                // ── Literals and built-in functions ─────────────────────
                True            => "TRUE",
                False           => "FALSE",
                Substr          => "SUBSTR",
                Substring       => "SUBSTRING",
                Val             => "VAL",
                Abs             => "ABS",
                Int             => "INT",
                Frac            => "FRAC",
                Sgn             => "SGN",
                Sqrt            => "SQRT",
                Ret             => "RET",
                Pos             => "POS",
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════
// STATEMENT DISPATCH
// ═══════════════════════════════════════════════════════════════════════════

/// Master statement dispatch table.
///
/// Each entry is `Keyword => parse_function`. Several keywords can share a
/// parse function, which then inspects the current keyword itself (the
/// arithmetic statements, the output statements).
///
/// This macro generates:
/// - The `parse_keyword_statement()` dispatch (if-else chain).
/// - The `is_statement_start()` predicate.
macro_rules! for_parse_dispatch {
    ($mac:ident) => {
        $mac! {
            Add         => parse_arithmetic_statement,
            Subtract    => parse_arithmetic_statement,
            Multiply    => parse_arithmetic_statement,
            Divide      => parse_arithmetic_statement,
            Assign      => parse_compute_statement,
            Compute     => parse_compute_statement,
            At          => parse_at_statement,
            Before      => parse_before_break_statement,
            Backout     => parse_backout_statement,
            Call        => parse_call_statement,
            Callnat     => parse_callnat_statement,
            Close       => parse_close_statement,
            Compress    => parse_compress_statement,
            Decide      => parse_decide_statement,
            Define      => parse_define_statement,
            Delete      => parse_delete_statement,
            Display     => parse_output_statement,
            Print       => parse_output_statement,
            Write       => parse_output_statement,
            Eject       => parse_simple_statement,
            Ignore      => parse_simple_statement,
            Retry       => parse_simple_statement,
            Stop        => parse_simple_statement,
            Terminate   => parse_simple_statement,
            End         => parse_end_statement,
            Escape      => parse_escape_statement,
            Examine     => parse_examine_statement,
            Expand      => parse_array_resize_statement,
            Resize      => parse_array_resize_statement,
            Reduce      => parse_array_resize_statement,
            Fetch       => parse_fetch_statement,
            Find        => parse_find_statement,
            For         => parse_for_statement,
            Format      => parse_format_statement,
            Get         => parse_get_statement,
            Histogram   => parse_histogram_statement,
            If          => parse_if_statement,
            Include     => parse_include_statement,
            Input       => parse_input_statement,
            Move        => parse_move_statement,
            Newpage     => parse_newpage_statement,
            On          => parse_on_error_statement,
            Parse       => parse_parse_statement,
            Perform     => parse_perform_statement,
            Read        => parse_read_statement,
            Reinput     => parse_reinput_statement,
            Repeat      => parse_repeat_statement,
            Reset       => parse_reset_statement,
            Run         => parse_run_statement,
            Separate    => parse_separate_statement,
            Set         => parse_set_statement,
            Skip        => parse_skip_statement,
            Stack       => parse_stack_statement,
            Store       => parse_store_statement,
            Update      => parse_update_statement,
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════

/// Master diagnostic table: `Variant => "CODE", severity`.
///
/// Codes are a published contract with lint suppressions and quick fixes;
/// never renumber an existing entry.
macro_rules! for_all_diagnostic_codes {
    ($mac:ident) => {
        $mac! {
            // ── Lexer ───────────────────────────────────────────────────
            UnknownCharacter            => "NPL001", Error,
            UnterminatedString          => "NPL002", Error,
            InvalidIdentifier           => "NPL003", Error,
            CopycodeParameterMissing    => "NPL004", Error,
            InvalidHexLiteral           => "NPL005", Error,

            // ── Parser ──────────────────────────────────────────────────
            NoDefineDataFound           => "NPP001", Error,
            MissingEndDefine            => "NPP002", Error,
            UnexpectedToken             => "NPP003", Error,
            BlockNotClosed              => "NPP004", Error,
            UnmatchedCloser             => "NPP005", Error,
            InvalidLength               => "NPP006", Error,
            DynamicNotAllowed           => "NPP007", Error,
            ArrayBoundNotConstant       => "NPP008", Error,
            UnresolvedUsing             => "NPP009", Error,
            UnresolvedDdm               => "NPP010", Warning,
            DdmFieldNotFound            => "NPP011", Error,
            UnresolvedRedefineTarget    => "NPP012", Error,
            EmptyGroup                  => "NPP013", Error,
            LevelSkipped                => "NPP014", Warning,
            RedefineTooLong             => "NPP015", Error,
            UnresolvedCopycode          => "NPP016", Error,
            UnresolvedModule            => "NPP017", Warning,
            CodeAfterEnd                => "NPP018", Warning,
            ParameterCountMismatch      => "NPP019", Error,
            MissingMandatoryParameter   => "NPP020", Error,
            PlaceholderForMandatory     => "NPP021", Error,
            IncludeTooDeep              => "NPP022", Error,

            // ── Resolver ────────────────────────────────────────────────
            UnresolvedReference         => "NPR001", Error,
            AmbiguousReference          => "NPR002", Error,
            UnresolvedSubroutine        => "NPR003", Error,

            // ── Type checks ─────────────────────────────────────────────
            TypeMismatch                => "NPT001", Error,
            ValueTruncated              => "NPT002", Warning,
            NotModifiable               => "NPT003", Error,
            DdmFormatMismatch           => "NPT004", Error,
            ConditionNeverTrue          => "NPT005", Warning,
            DecideValueNeverMatches     => "NPT006", Warning,
        }
    };
}
