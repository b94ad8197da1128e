use pretty::DocAllocator;

use super::tokens::COMMA;
use super::types::*;

/// Join documents with `, `, allowing a break after each comma.
pub fn comma_separated<'a, I>(alloc: &'a Alloc<'a>, docs: I) -> Builder<'a>
where
    I: IntoIterator<Item = Builder<'a>>,
{
    alloc.intersperse(docs, alloc.text(COMMA).append(alloc.line()))
}

pub trait ParensExt<'a> {
    fn parens_group(self) -> Builder<'a>;
}

impl<'a> ParensExt<'a> for Builder<'a> {
    fn parens_group(self) -> Builder<'a> {
        self.group().enclose("(", ")")
    }
}
