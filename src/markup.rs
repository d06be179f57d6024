//! Renderer for the small markup dialect used by analysis text.
//!
//! Supported: `**strong**`, `*light*`, line breaks, and `- ` bullets at the
//! start of any line after the first. Rules run in a fixed order over the
//! whole text and never recurse:
//!
//! 1. [`Rule::Strong`] turns each `**X**` into strong X.
//! 2. [`Rule::Light`] turns each remaining `*X*` into light X.
//! 3. [`Rule::Bullet`] turns a newline followed by plain `- ` into a break plus `• `.
//! 4. [`Rule::Break`] turns every other newline into a break.
//!
//! Spans never cross a newline and close at the first matching delimiter.
//! Because rule 2 only sees asterisks left behind by rule 1, `**bold**` is
//! never read as light emphasis around `*bold*`.

pub const BULLET: &str = "• ";

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub strong: bool,
    pub light: bool,
}

impl Segment {
    #[cfg(test)]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strong: false,
            light: false,
        }
    }
}

/// One rendered line. `bullet` lines are prefixed with [`BULLET`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupLine {
    pub bullet: bool,
    pub segments: Vec<Segment>,
}

impl MarkupLine {
    /// Visible text of the line, bullet glyph included.
    #[cfg(test)]
    pub fn text(&self) -> String {
        let mut out = String::new();
        if self.bullet {
            out.push_str(BULLET);
        }
        for segment in &self.segments {
            out.push_str(&segment.text);
        }
        out
    }
}

/// Substitution rules, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Strong,
    Light,
    Bullet,
    Break,
}

pub const RULES: [Rule; 4] = [Rule::Strong, Rule::Light, Rule::Bullet, Rule::Break];

#[derive(Debug, Clone, Copy)]
struct StyledChar {
    ch: char,
    strong: bool,
    light: bool,
}

impl StyledChar {
    fn is_plain(&self) -> bool {
        !self.strong && !self.light
    }
}

/// Intermediate document: the text split at newlines, each line a run of styled chars.
struct Document {
    lines: Vec<Vec<StyledChar>>,
    bullets: Vec<bool>,
}

impl Document {
    fn parse(input: &str) -> Self {
        let lines: Vec<Vec<StyledChar>> = input
            .split('\n')
            .map(|line| {
                line.chars()
                    .map(|ch| StyledChar {
                        ch,
                        strong: false,
                        light: false,
                    })
                    .collect()
            })
            .collect();
        let bullets = vec![false; lines.len()];
        Self { lines, bullets }
    }

    fn apply(&mut self, rule: Rule) {
        match rule {
            Rule::Strong => {
                for line in &mut self.lines {
                    apply_strong(line);
                }
            }
            Rule::Light => {
                for line in &mut self.lines {
                    apply_light(line);
                }
            }
            Rule::Bullet => {
                // The first line has no preceding newline.
                for (line, bullet) in self.lines.iter_mut().zip(self.bullets.iter_mut()).skip(1) {
                    if starts_with_plain_dash(line) {
                        line.drain(..2);
                        *bullet = true;
                    }
                }
            }
            // Every newline is already a line boundary in `Document`.
            Rule::Break => {}
        }
    }

    fn into_lines(self) -> Vec<MarkupLine> {
        self.lines
            .into_iter()
            .zip(self.bullets)
            .map(|(chars, bullet)| MarkupLine {
                bullet,
                segments: segments(&chars),
            })
            .collect()
    }
}

fn starts_with_plain_dash(line: &[StyledChar]) -> bool {
    matches!(line, [dash, space, ..] if dash.ch == '-' && space.ch == ' ' && dash.is_plain() && space.is_plain())
}

/// Replace `**X**` spans: lazily match the next `**` after each opener.
fn apply_strong(line: &mut Vec<StyledChar>) {
    let mut out = Vec::with_capacity(line.len());
    let mut i = 0;
    while i < line.len() {
        if is_double_star(line, i) {
            if let Some(close) = (i + 2..line.len()).find(|&j| is_double_star(line, j)) {
                out.extend(line[i + 2..close].iter().map(|c| StyledChar {
                    strong: true,
                    ..*c
                }));
                i = close + 2;
                continue;
            }
        }
        out.push(line[i]);
        i += 1;
    }
    *line = out;
}

/// Replace `*X*` spans among the asterisks left after [`apply_strong`].
fn apply_light(line: &mut Vec<StyledChar>) {
    let mut out = Vec::with_capacity(line.len());
    let mut i = 0;
    while i < line.len() {
        if line[i].ch == '*' {
            if let Some(close) = (i + 1..line.len()).find(|&j| line[j].ch == '*') {
                out.extend(line[i + 1..close].iter().map(|c| StyledChar {
                    light: true,
                    ..*c
                }));
                i = close + 1;
                continue;
            }
        }
        out.push(line[i]);
        i += 1;
    }
    *line = out;
}

fn is_double_star(line: &[StyledChar], at: usize) -> bool {
    at + 1 < line.len() && line[at].ch == '*' && line[at + 1].ch == '*'
}

fn segments(chars: &[StyledChar]) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for c in chars {
        match out.last_mut() {
            Some(last) if last.strong == c.strong && last.light == c.light => last.text.push(c.ch),
            _ => out.push(Segment {
                text: c.ch.to_string(),
                strong: c.strong,
                light: c.light,
            }),
        }
    }
    out
}

/// Render analysis markup into styled lines.
pub fn render(input: &str) -> Vec<MarkupLine> {
    let mut doc = Document::parse(input);
    for rule in RULES {
        doc.apply(rule);
    }
    doc.into_lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong(text: &str) -> Segment {
        Segment {
            text: text.to_string(),
            strong: true,
            light: false,
        }
    }

    fn light(text: &str) -> Segment {
        Segment {
            text: text.to_string(),
            strong: false,
            light: true,
        }
    }

    #[test]
    fn test_mixed_sample() {
        let lines = render("**bold** and *italic*\n- item1\n- item2");

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0].segments,
            vec![strong("bold"), Segment::plain(" and "), light("italic")]
        );
        assert!(!lines[0].bullet);
        assert!(lines[1].bullet);
        assert_eq!(lines[1].text(), "• item1");
        assert!(lines[2].bullet);
        assert_eq!(lines[2].text(), "• item2");
        assert!(lines.iter().all(|l| !l.text().contains('*')));
    }

    #[test]
    fn test_strong_is_not_read_as_light() {
        let lines = render("**bold**");
        assert_eq!(lines[0].segments, vec![strong("bold")]);
    }

    #[test]
    fn test_light_inside_strong_span() {
        let lines = render("**a*b*c**");
        assert_eq!(
            lines[0].segments,
            vec![
                strong("a"),
                Segment {
                    text: "b".to_string(),
                    strong: true,
                    light: true,
                },
                strong("c"),
            ]
        );
    }

    #[test]
    fn test_triple_star_opens_strong_with_literal_star() {
        // Lazy match: the first `**` closes, leaving `*a` as strong content.
        let lines = render("***a**");
        assert_eq!(lines[0].text(), "*a");
        assert_eq!(lines[0].segments, vec![strong("*a")]);
    }

    #[test]
    fn test_unclosed_markers_stay_literal() {
        let lines = render("price * 2");
        assert_eq!(lines[0].text(), "price * 2");
    }

    #[test]
    fn test_unclosed_strong_falls_through_to_light() {
        // `**open` has no closing `**`, so rule 2 pairs its two asterisks.
        let lines = render("**open");
        assert_eq!(lines[0].segments, vec![Segment::plain("open")]);
    }

    #[test]
    fn test_spans_do_not_cross_lines() {
        let lines = render("*start\nend*");
        assert_eq!(lines[0].text(), "*start");
        assert_eq!(lines[1].text(), "end*");
    }

    #[test]
    fn test_first_line_dash_is_not_bullet() {
        let lines = render("- first\n- second");
        assert!(!lines[0].bullet);
        assert_eq!(lines[0].text(), "- first");
        assert!(lines[1].bullet);
    }

    #[test]
    fn test_emphasized_dash_is_not_bullet() {
        let lines = render("x\n**- y**");
        assert!(!lines[1].bullet);
        assert_eq!(lines[1].segments, vec![strong("- y")]);
    }

    #[test]
    fn test_dash_without_space_is_plain_line() {
        let lines = render("a\n-b\n\nc");
        assert_eq!(lines.len(), 4);
        assert!(!lines[1].bullet);
        assert_eq!(lines[1].text(), "-b");
        assert!(lines[2].segments.is_empty());
    }

    #[test]
    fn test_bullet_with_emphasis() {
        let lines = render("Outlook:\n- **Buy** rating");
        assert!(lines[1].bullet);
        assert_eq!(lines[1].segments, vec![strong("Buy"), Segment::plain(" rating")]);
    }
}
