//! The files written for each compiled input.

use std::fmt;
use std::path::{Path, PathBuf};

/// How far a command runs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Lex,
    Parse,
    Build,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    LexTokens,
    LexErrors,
    Derivation,
    SyntaxErrors,
    Ast,
    SymbolTables,
    SemanticErrors,
    Assembly,
}

impl Artifact {
    pub const ALL: [Artifact; 8] = [
        Artifact::LexTokens,
        Artifact::LexErrors,
        Artifact::Derivation,
        Artifact::SyntaxErrors,
        Artifact::Ast,
        Artifact::SymbolTables,
        Artifact::SemanticErrors,
        Artifact::Assembly,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            Artifact::LexTokens => "outlextokens",
            Artifact::LexErrors => "outlexerrors",
            Artifact::Derivation => "outderivation",
            Artifact::SyntaxErrors => "outsyntaxerrors",
            Artifact::Ast => "outast",
            Artifact::SymbolTables => "outsymboltables",
            Artifact::SemanticErrors => "outsemanticerrors",
            Artifact::Assembly => "moon",
        }
    }

    /// The phase that produces this artifact.
    pub fn phase(self) -> Phase {
        match self {
            Artifact::LexTokens | Artifact::LexErrors => Phase::Lex,
            Artifact::Derivation | Artifact::SyntaxErrors | Artifact::Ast => Phase::Parse,
            Artifact::SymbolTables | Artifact::SemanticErrors | Artifact::Assembly => Phase::Build,
        }
    }

    /// `<outdir>/<name>.<extension>`
    pub fn path(self, outdir: &Path, name: &str) -> PathBuf {
        outdir.join(format!("{name}.{}", self.extension()))
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl Phase {
    /// Tokens for `lex`, the tree for `parse`, the program for `build`.
    pub fn primary(self) -> Artifact {
        match self {
            Phase::Lex => Artifact::LexTokens,
            Phase::Parse => Artifact::Ast,
            Phase::Build => Artifact::Assembly,
        }
    }

    /// The artifacts a command writes. With `debug`, those of earlier phases too.
    pub fn artifacts(self, debug: bool) -> Vec<Artifact> {
        Artifact::ALL
            .into_iter()
            .filter(|artifact| artifact.phase() == self || (debug && artifact.phase() < self))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_per_command() {
        assert_eq!(Phase::Lex.artifacts(true), vec![Artifact::LexTokens, Artifact::LexErrors]);
        assert_eq!(
            Phase::Parse.artifacts(false),
            vec![Artifact::Derivation, Artifact::SyntaxErrors, Artifact::Ast]
        );
        assert_eq!(Phase::Build.artifacts(true).len(), 8);
        assert_eq!(Phase::Build.artifacts(false).last(), Some(&Artifact::Assembly));
    }

    #[test]
    fn artifact_paths() {
        let path = Artifact::SemanticErrors.path(Path::new("out"), "bubblesort");
        assert_eq!(path, Path::new("out/bubblesort.outsemanticerrors"));
        assert_eq!(Artifact::Assembly.path(Path::new(""), "a"), Path::new("a.moon"));
    }
}
