//! Token formatting and indentation for the S-expression writer.

use crate::geometry::{round_angle, Point, Size};
use crate::layers::{LayerSet, PcbLayerId};
use crate::parser::sexp::quote;
use crate::units::{format_mm, Biu};

/// Line-oriented output with tab indentation, one nesting level per tab.
#[derive(Debug, Default)]
pub(crate) struct Output {
    buf: String,
}

impl Output {
    pub fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.buf.push('\t');
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

pub(crate) fn mm(value: Biu) -> String {
    format_mm(value)
}

/// Plain decimal rendering of a ratio or angle, never in exponent form.
pub(crate) fn num(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value}")
}

pub(crate) fn xy(p: Point) -> String {
    format!("{} {}", mm(p.x), mm(p.y))
}

pub(crate) fn size(s: Size) -> String {
    format!("(size {} {})", mm(s.width), mm(s.height))
}

/// `(at x y [angle])`, the angle omitted when zero.
pub(crate) fn at(p: Point, angle: f64) -> String {
    let angle = round_angle(angle);
    if angle == 0.0 {
        format!("(at {})", xy(p))
    } else {
        format!("(at {} {})", xy(p), num(angle))
    }
}

pub(crate) fn pts(points: &[Point]) -> String {
    let mut out = String::from("(pts");
    for p in points {
        out.push_str(" (xy ");
        out.push_str(&xy(*p));
        out.push(')');
    }
    out.push(')');
    out
}

pub(crate) fn quoted(text: &str) -> String {
    quote(text)
}

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn layer(layer: PcbLayerId) -> String {
    format!("(layer {})", quote(layer.name()))
}

/// Layer names for a `(layers ...)` list, folding front/back pairs and the
/// full copper stack into wildcards.
pub(crate) fn layer_names(set: LayerSet) -> Vec<String> {
    const PAIRS: [(&str, PcbLayerId, PcbLayerId); 6] = [
        ("*.Adhes", PcbLayerId::B_ADHES, PcbLayerId::F_ADHES),
        ("*.Paste", PcbLayerId::B_PASTE, PcbLayerId::F_PASTE),
        ("*.SilkS", PcbLayerId::B_SILKS, PcbLayerId::F_SILKS),
        ("*.Mask", PcbLayerId::B_MASK, PcbLayerId::F_MASK),
        ("*.CrtYd", PcbLayerId::B_CRTYD, PcbLayerId::F_CRTYD),
        ("*.Fab", PcbLayerId::B_FAB, PcbLayerId::F_FAB),
    ];
    let mut rest = set;
    let mut names = Vec::new();
    if set.is_superset(LayerSet::all_copper()) {
        names.push("*.Cu".to_string());
        rest = rest.intersection(LayerSet::from_iter(
            PcbLayerId::all().filter(|l| !l.is_copper()),
        ));
    }
    for (wildcard, back, front) in PAIRS {
        if rest.contains(back) && rest.contains(front) {
            names.push(wildcard.to_string());
            rest.remove(back);
            rest.remove(front);
        }
    }
    names.extend(rest.iter().map(|l| l.name().to_string()));
    names
}

pub(crate) fn layers(set: LayerSet) -> String {
    let names: Vec<String> = layer_names(set).iter().map(|n| quote(n)).collect();
    format!("(layers {})", names.join(" "))
}
