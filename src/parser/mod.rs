pub mod driver;
pub mod table;
pub mod typecheck;

pub use driver::{ActionObserver, ParseError, ParseErrorKind, SyntaxAnalyzer};
pub use table::{Action, LrTable, NonTerminal, Production, State, LR_TABLE};
