use pretty::DocAllocator;

use super::types::*;

pub trait ThemeExt<'a> {
    fn keyword(&'a self, text: &'a str) -> Builder<'a>;
    fn typ(&'a self, text: &'a str) -> Builder<'a>;
    fn ident(&'a self, text: &'a str) -> Builder<'a>;
    fn literal(&'a self, text: &'a str) -> Builder<'a>;
    fn op(&'a self, text: &'a str) -> Builder<'a>;
    fn comment(&'a self, text: &'a str) -> Builder<'a>;
    fn error(&'a self, text: &'a str) -> Builder<'a>;
}

impl<'a> ThemeExt<'a> for Alloc<'a> {
    fn keyword(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Keyword)
    }

    fn typ(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Type)
    }

    fn ident(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Identifier)
    }

    fn literal(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Literal)
    }

    fn op(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Operator)
    }

    fn comment(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Comment)
    }

    fn error(&'a self, text: &'a str) -> Builder<'a> {
        self.text(text).annotate(Anno::Error)
    }
}
