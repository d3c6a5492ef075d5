//! Best-effort SMILES structure depiction.
//!
//! This is not a cheminformatics-grade renderer. The scanner recognizes the
//! usual SMILES tokens (bracket atoms, two-character elements, aromatic
//! atoms, bonds, branches, ring closures) and the renderer places the heavy
//! atoms on a circle with bonds drawn from branch and ring connectivity.
//! Anything the scanner cannot make sense of yields `None`, which the demo
//! treats as "no image" rather than an error.

use std::collections::HashMap;

const IMAGE_SIZE: f64 = 400.0;
const MARGIN: f64 = 48.0;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Display text for an atom, e.g. `C`, `Br`, `[nH]`.
    Atom(String),
    Bond,
    OpenBranch,
    CloseBranch,
    RingClosure(u8),
    Dot,
}

/// Scans a SMILES string into tokens. Returns `None` on anything that is not
/// valid SMILES syntax (unclosed bracket, unknown character, empty input).
fn scan(smiles: &str) -> Option<Vec<Token>> {
    let bytes = smiles.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            '[' => {
                let end = smiles[i..].find(']').map(|p| i + p)?;
                if end == i + 1 {
                    return None; // empty bracket atom
                }
                tokens.push(Token::Atom(smiles[i..=end].to_string()));
                i = end + 1;
            }
            'B' | 'C' => {
                // Br and Cl are two-character elements.
                let next = bytes.get(i + 1).map(|&b| b as char);
                let two = matches!((c, next), ('B', Some('r')) | ('C', Some('l')));
                let len = if two { 2 } else { 1 };
                tokens.push(Token::Atom(smiles[i..i + len].to_string()));
                i += len;
            }
            'N' | 'O' | 'S' | 'P' | 'F' | 'I' | 'b' | 'c' | 'n' | 'o' | 's' | 'p' => {
                tokens.push(Token::Atom(c.to_string()));
                i += 1;
            }
            '=' | '#' | '-' | '+' | ':' | '~' | '/' | '\\' | '@' => {
                tokens.push(Token::Bond);
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenBranch);
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseBranch);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '%' => {
                let d1 = bytes.get(i + 1)?.checked_sub(b'0')?;
                let d2 = bytes.get(i + 2)?.checked_sub(b'0')?;
                if d1 > 9 || d2 > 9 {
                    return None;
                }
                tokens.push(Token::RingClosure(d1 * 10 + d2));
                i += 3;
            }
            '0'..='9' => {
                tokens.push(Token::RingClosure(c as u8 - b'0'));
                i += 1;
            }
            _ => return None,
        }
    }

    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

struct Molecule {
    atoms: Vec<String>,
    bonds: Vec<(usize, usize)>,
}

/// Builds atom/bond connectivity from the token stream, tracking branches
/// with a stack and ring closures with a digit map.
fn connect(tokens: &[Token]) -> Option<Molecule> {
    let mut atoms: Vec<String> = Vec::new();
    let mut bonds: Vec<(usize, usize)> = Vec::new();
    let mut prev: Option<usize> = None;
    let mut branch_stack: Vec<Option<usize>> = Vec::new();
    let mut open_rings: HashMap<u8, usize> = HashMap::new();

    for token in tokens {
        match token {
            Token::Atom(label) => {
                let idx = atoms.len();
                atoms.push(label.clone());
                if let Some(p) = prev {
                    bonds.push((p, idx));
                }
                prev = Some(idx);
            }
            Token::Bond => {}
            Token::OpenBranch => branch_stack.push(prev),
            Token::CloseBranch => prev = branch_stack.pop()?,
            Token::RingClosure(n) => {
                let here = prev?;
                match open_rings.remove(n) {
                    // A ring digit opened and closed on the same atom would
                    // be a self-loop bond; reject it.
                    Some(there) if there == here => return None,
                    Some(there) => bonds.push((there, here)),
                    None => {
                        open_rings.insert(*n, here);
                    }
                }
            }
            Token::Dot => prev = None,
        }
    }

    if !branch_stack.is_empty() || !open_rings.is_empty() {
        return None; // unbalanced branches or unclosed rings
    }
    Some(Molecule { atoms, bonds })
}

/// Renders a SMILES string to an SVG document, or `None` if the string does
/// not parse.
pub fn draw_molecule(smiles: &str) -> Option<String> {
    let tokens = scan(smiles.trim())?;
    let molecule = connect(&tokens)?;
    Some(render_svg(&molecule))
}

fn render_svg(molecule: &Molecule) -> String {
    let n = molecule.atoms.len();
    let center = IMAGE_SIZE / 2.0;
    let radius = center - MARGIN;

    let positions: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            if n == 1 {
                (center, center)
            } else {
                let angle = 2.0 * std::f64::consts::PI * i as f64 / n as f64
                    - std::f64::consts::FRAC_PI_2;
                (center + radius * angle.cos(), center + radius * angle.sin())
            }
        })
        .collect();

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{s}\" height=\"{s}\" viewBox=\"0 0 {s} {s}\">\
         <rect width=\"{s}\" height=\"{s}\" fill=\"white\"/>",
        s = IMAGE_SIZE
    );
    for &(a, b) in &molecule.bonds {
        let (x1, y1) = positions[a];
        let (x2, y2) = positions[b];
        svg.push_str(&format!(
            "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" \
             stroke=\"#444\" stroke-width=\"2\"/>"
        ));
    }
    for (i, label) in molecule.atoms.iter().enumerate() {
        let (x, y) = positions[i];
        let text = html_escape::encode_text(label);
        svg.push_str(&format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"14\" fill=\"#eef\" stroke=\"#88a\"/>\
             <text x=\"{x:.1}\" y=\"{y:.1}\" dy=\"4\" text-anchor=\"middle\" \
             font-family=\"sans-serif\" font-size=\"12\">{text}</text>"
        ));
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_chain_parses() {
        let tokens = scan("CCO").unwrap();
        assert_eq!(tokens.len(), 3);
        let molecule = connect(&tokens).unwrap();
        assert_eq!(molecule.atoms, vec!["C", "C", "O"]);
        assert_eq!(molecule.bonds, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn two_character_elements_are_single_atoms() {
        let molecule = connect(&scan("CBrCl").unwrap()).unwrap();
        assert_eq!(molecule.atoms, vec!["C", "Br", "Cl"]);
    }

    #[test]
    fn branches_reconnect_to_the_stem() {
        // Isobutane: central carbon bonded to three others.
        let molecule = connect(&scan("CC(C)C").unwrap()).unwrap();
        assert_eq!(molecule.bonds, vec![(0, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn ring_closures_add_a_bond() {
        // Benzene: six atoms, six bonds.
        let molecule = connect(&scan("c1ccccc1").unwrap()).unwrap();
        assert_eq!(molecule.atoms.len(), 6);
        assert_eq!(molecule.bonds.len(), 6);
        assert!(molecule.bonds.contains(&(0, 5)));
    }

    #[test]
    fn bracket_atoms_keep_their_text() {
        let molecule = connect(&scan("C[C@@H](N)O").unwrap()).unwrap();
        assert_eq!(molecule.atoms[1], "[C@@H]");
    }

    #[test]
    fn invalid_input_yields_none() {
        assert!(draw_molecule("").is_none());
        assert!(draw_molecule("not a molecule!").is_none());
        assert!(draw_molecule("C[unclosed").is_none());
        assert!(draw_molecule("CC)C").is_none());
        assert!(draw_molecule("C1CC").is_none()); // unclosed ring
    }

    #[test]
    fn ring_closing_onto_its_own_atom_is_invalid() {
        assert!(connect(&scan("C11").unwrap()).is_none());
        assert!(draw_molecule("C11").is_none());
        // A real two-atom ring closure is still fine.
        assert!(draw_molecule("C1CC1").is_some());
    }

    #[test]
    fn valid_input_yields_svg() {
        let svg = draw_molecule("CCO").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<line"));
        assert!(svg.ends_with("</svg>"));
    }
}
