use std::{iter::Peekable, str::Chars};

use xtag_proto::ports::typeset::{TypesetError, TypesetOutput, TypesetPort, TypesetRequest};

/// Deepest group or command-argument nesting accepted.
const MAX_NESTING: usize = 128;

/// Built-in engine that renders a small TeX subset as plain Unicode text.
///
/// Supports Greek letters, common operators and relations, `\frac`, `\sqrt`
/// and `^`/`_` scripts. Unknown control sequences and unbalanced braces reject
/// the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeTypesetter;

impl TypesetPort for UnicodeTypesetter {
    fn typeset(&self, request: &TypesetRequest) -> Result<TypesetOutput, TypesetError> {
        let mut parser = Parser {
            chars: request.source.chars().peekable(),
            depth: 0,
        };

        Ok(TypesetOutput {
            rendered: parser.sequence(false)?.trim().to_owned(),
            mode: request.mode,
        })
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, TypesetError>,
    ) -> Result<T, TypesetError> {
        if self.depth >= MAX_NESTING {
            return Err(TypesetError::rejected(format!(
                "nesting deeper than {MAX_NESTING} levels"
            )));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn sequence(&mut self, in_group: bool) -> Result<String, TypesetError> {
        let mut out = String::new();

        while let Some(c) = self.chars.next() {
            match c {
                '\\' => self.command(&mut out)?,
                '{' => out.push_str(&self.nested(|parser| parser.sequence(true))?),
                '}' if in_group => return Ok(out),
                '}' => return Err(TypesetError::rejected("unbalanced `}`")),
                '^' => {
                    let argument = self.argument()?;
                    out.push_str(&script(&argument, '^', superscript));
                }
                '_' => {
                    let argument = self.argument()?;
                    out.push_str(&script(&argument, '_', subscript));
                }
                c => out.push(c),
            }
        }

        if in_group {
            Err(TypesetError::rejected("missing `}`"))
        } else {
            Ok(out)
        }
    }

    fn argument(&mut self) -> Result<String, TypesetError> {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}

        match self.chars.next() {
            Some('{') => self.nested(|parser| parser.sequence(true)),
            Some('\\') => self.nested(|parser| {
                let mut out = String::new();
                parser.command(&mut out)?;
                Ok(out)
            }),
            Some('}') | None => Err(TypesetError::rejected("missing argument")),
            Some(c) => Ok(c.to_string()),
        }
    }

    fn command(&mut self, out: &mut String) -> Result<(), TypesetError> {
        let mut name = String::new();
        while let Some(c) = self.chars.next_if(|c| c.is_ascii_alphabetic()) {
            name.push(c);
        }

        if name.is_empty() {
            return match self.chars.next() {
                Some(',' | ':' | ';' | ' ') => {
                    out.push(' ');
                    Ok(())
                }
                Some(c) => {
                    out.push(c);
                    Ok(())
                }
                None => Err(TypesetError::rejected("trailing `\\`")),
            };
        }

        match name.as_str() {
            "frac" => {
                let numerator = self.argument()?;
                let denominator = self.argument()?;
                out.push_str(&format!("{}/{}", group(&numerator), group(&denominator)));
            }
            "sqrt" => {
                let radicand = self.argument()?;
                out.push('√');
                out.push_str(&group(&radicand));
            }
            "left" | "right" => {}
            other => match symbol(other) {
                Some(symbol) => out.push_str(symbol),
                None => {
                    return Err(TypesetError::rejected(format!(
                        "unknown command `\\{other}`"
                    )));
                }
            },
        }

        Ok(())
    }
}

/// Parenthesizes compound operands so `\frac{a+b}{2}` reads `(a+b)/2`.
fn group(operand: &str) -> String {
    if operand.chars().all(char::is_alphanumeric) {
        operand.to_owned()
    } else {
        format!("({operand})")
    }
}

fn script(argument: &str, marker: char, map: fn(char) -> Option<char>) -> String {
    argument
        .chars()
        .map(map)
        .collect::<Option<String>>()
        .unwrap_or_else(|| {
            if argument.chars().count() == 1 {
                format!("{marker}{argument}")
            } else {
                format!("{marker}({argument})")
            }
        })
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'n' => 'ⁿ',
        'i' => 'ⁱ',
        _ => return None,
    })
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        _ => return None,
    })
}

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" | "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "iota" => "ι",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "upsilon" => "υ",
        "phi" | "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Xi" => "Ξ",
        "Pi" => "Π",
        "Sigma" => "Σ",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        "cdot" => "·",
        "times" => "×",
        "div" => "÷",
        "pm" => "±",
        "mp" => "∓",
        "infty" => "∞",
        "partial" => "∂",
        "nabla" => "∇",
        "sum" => "∑",
        "prod" => "∏",
        "int" => "∫",
        "oint" => "∮",
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "equiv" => "≡",
        "sim" => "∼",
        "propto" => "∝",
        "in" => "∈",
        "notin" => "∉",
        "subset" => "⊂",
        "subseteq" => "⊆",
        "cup" => "∪",
        "cap" => "∩",
        "forall" => "∀",
        "exists" => "∃",
        "emptyset" => "∅",
        "to" | "rightarrow" => "→",
        "leftarrow" => "←",
        "Rightarrow" | "implies" => "⇒",
        "Leftrightarrow" | "iff" => "⇔",
        "ldots" | "dots" => "…",
        "cdots" => "⋯",
        "quad" => "  ",
        "sin" => "sin",
        "cos" => "cos",
        "tan" => "tan",
        "log" => "log",
        "ln" => "ln",
        "exp" => "exp",
        "lim" => "lim",
        "max" => "max",
        "min" => "min",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use xtag_proto::ports::typeset::MathMode;

    use super::*;

    fn render(source: &str) -> Result<String, TypesetError> {
        UnicodeTypesetter
            .typeset(&TypesetRequest {
                source: source.to_owned(),
                mode: MathMode::Inline,
            })
            .map(|output| output.rendered)
    }

    #[test]
    fn renders_symbols() {
        assert_eq!(render("\\alpha + \\beta \\leq \\infty").as_deref(), Ok("α + β ≤ ∞"));
        assert_eq!(render("\\sum_{i=1}^{n} x_i").as_deref(), Ok("∑_(i=1)ⁿ x_i"));
    }

    #[test]
    fn renders_scripts() {
        assert_eq!(render("E = mc^2").as_deref(), Ok("E = mc²"));
        assert_eq!(render("x_{10}").as_deref(), Ok("x₁₀"));
        assert_eq!(render("e^{i\\pi}").as_deref(), Ok("e^(iπ)"));
    }

    #[test]
    fn renders_fractions_and_roots() {
        assert_eq!(render("\\frac{1}{2}").as_deref(), Ok("1/2"));
        assert_eq!(render("\\frac{a+b}{2}").as_deref(), Ok("(a+b)/2"));
        assert_eq!(render("\\sqrt{x^2 + 1}").as_deref(), Ok("√(x² + 1)"));
        assert_eq!(render("\\sqrt 2").as_deref(), Ok("√2"));
    }

    #[test]
    fn keeps_requested_mode() {
        let output = UnicodeTypesetter
            .typeset(&TypesetRequest {
                source: "x".to_owned(),
                mode: MathMode::Display,
            })
            .expect("typeset");

        assert_eq!(output.mode, MathMode::Display);
    }

    #[test]
    fn rejects_unknown_commands() {
        assert_eq!(
            render("\\foo"),
            Err(TypesetError::rejected("unknown command `\\foo`"))
        );
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert_eq!(render("{x"), Err(TypesetError::rejected("missing `}`")));
        assert_eq!(render("x}"), Err(TypesetError::rejected("unbalanced `}`")));
        assert_eq!(render("\\frac{1}"), Err(TypesetError::rejected("missing argument")));
    }

    #[test]
    fn rejects_runaway_nesting() {
        let braces = format!("{}x{}", "{".repeat(10_000), "}".repeat(10_000));
        let roots = format!("{}2", "\\sqrt".repeat(10_000));
        let expected = Err(TypesetError::rejected(format!(
            "nesting deeper than {MAX_NESTING} levels"
        )));

        assert_eq!(render(&braces), expected);
        assert_eq!(render(&roots), expected);
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        let braces = format!("{}x{}", "{".repeat(MAX_NESTING), "}".repeat(MAX_NESTING));

        assert_eq!(render(&braces).as_deref(), Ok("x"));
    }
}
