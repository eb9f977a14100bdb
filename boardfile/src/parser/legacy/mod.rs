//! Reader for the legacy line-record board format (`.brd`).
//!
//! The file is a header line followed by `$SECTION` / `$EndSECTION` blocks.
//! Lengths are deci-mils unless `$GENERAL` switches to millimetres, and
//! angles are tenths of a degree.

mod footprint;
mod items;
mod sections;

use crate::board::{Board, BoardBuilder};
use crate::error::{BoardError, Warning, WarningKind};
use crate::geometry::{Point, Size};
use crate::kiid::Kiid;
use crate::layers::{legacy_layer_to_canonical, PcbLayerId};
use crate::options::LoadPolicy;
use crate::units::{Biu, LegacyUnits};

use super::context::ParseContext;
use super::lines::{Field, Fields, Line, LineReader};
use super::values::{parse_angle, parse_board_units, parse_double, parse_hex, parse_int, Site};

/// Newest legacy format version this reader understands.
pub const LEGACY_BOARD_FILE_VERSION: u32 = 2;

/// Legacy angles are stored in tenths of a degree.
const ANGLE_SCALE: f64 = 0.1;

pub struct LegacyParser<'a, 'p> {
    reader: LineReader<'a>,
    ctx: ParseContext<'p>,
    builder: BoardBuilder,
    source: String,
    scale: f64,
}

impl<'a, 'p> LegacyParser<'a, 'p> {
    pub fn new(text: &'a str, source: &str, policy: &'p mut dyn LoadPolicy) -> Self {
        let reader = LineReader::new(text);
        let mut ctx = ParseContext::new(source, policy);
        ctx.set_total_lines(reader.total_lines());
        Self {
            reader,
            ctx,
            builder: BoardBuilder::new(),
            source: source.to_string(),
            scale: LegacyUnits::DeciMils.scale(),
        }
    }

    /// Read the whole file and finalize the board.
    pub fn parse(mut self) -> Result<(Board, Vec<Warning>), BoardError> {
        let version = self.parse_header()?;
        self.builder.board_mut().version = version;

        loop {
            let Some(line) = self.read_line()? else {
                let last = self.reader.line_number();
                return Err(self.ctx.error(last, 0, "missing '$EndBOARD'"));
            };
            let keyword = line.keyword();
            if !keyword.starts_with('$') {
                continue;
            }
            match keyword.to_ascii_uppercase().as_str() {
                "$GENERAL" => self.parse_general()?,
                "$SHEETDESCR" => self.parse_sheet()?,
                "$SETUP" => self.parse_setup()?,
                "$EQUIPOT" => self.parse_equipot()?,
                "$NCLASS" => self.parse_netclass(&line)?,
                "$MODULE" => {
                    let footprint = self.parse_module(&line)?;
                    self.builder.add_footprint(footprint);
                }
                "$DRAWSEGMENT" => self.parse_drawsegment()?,
                "$TEXTPCB" => self.parse_textpcb()?,
                "$TRACK" => self.parse_tracks("$EndTRACK")?,
                "$ZONE" => self.skip_obsolete_zone(&line)?,
                "$CZONE_OUTLINE" => self.parse_zone_outline(&line)?,
                "$COTATION" | "$DIMENSION" => self.parse_dimension()?,
                "$PCB_TARGET" | "$MIREPCB" => self.parse_target(&line)?,
                "$ENDBOARD" => break,
                _ => {
                    tracing::debug!(line = line.number, keyword, "ignoring unknown section");
                }
            }
        }

        self.ctx.report(self.reader.total_lines())?;
        let LegacyParser {
            mut ctx, builder, ..
        } = self;
        let (board, finalize_warnings) = builder.finalize(ctx.policy())?;
        let mut warnings = ctx.take_warnings();
        warnings.extend(finalize_warnings);
        Ok((board, warnings))
    }

    fn parse_header(&mut self) -> Result<u32, BoardError> {
        let Some(line) = self.read_line()? else {
            return Err(self.ctx.error(1, 0, "empty file"));
        };
        if !line.starts_with("PCBNEW-BOARD") {
            return Err(self.ctx.error(line.number, 0, "not a legacy board file"));
        }
        let mut fields = line.args();
        let mut version = 1;
        while let Some(field) = fields.next() {
            if field.text.eq_ignore_ascii_case("Version") {
                let Some(value) = fields.next() else {
                    break;
                };
                let site = Site::new(&self.source, line.number, value.offset);
                version = parse_int(&value.text, site)?;
                break;
            }
        }
        let version = u32::try_from(version)
            .map_err(|_| self.ctx.error(line.number, 0, format!("invalid version {version}")))?;
        if version > LEGACY_BOARD_FILE_VERSION {
            return Err(BoardError::Version {
                found: version,
                supported: LEGACY_BOARD_FILE_VERSION,
            });
        }
        tracing::debug!(version, "legacy board header");
        Ok(version)
    }

    /// Next significant line, polling the progress callback as lines go by.
    fn read_line(&mut self) -> Result<Option<Line<'a>>, BoardError> {
        let line = self.reader.next_line();
        if let Some(line) = &line {
            self.ctx.checkpoint(line.number)?;
        }
        Ok(line)
    }

    /// Next line inside `section`. Running out of input is fatal.
    fn section_line(&mut self, end: &str) -> Result<Line<'a>, BoardError> {
        match self.read_line()? {
            Some(line) => Ok(line),
            None => {
                let last = self.reader.line_number();
                Err(self.ctx.error(last, 0, format!("missing '{end}'")))
            }
        }
    }

    fn args<'s>(&'s self, line: &Line<'a>) -> Args<'a, 's> {
        Args::new(line.args(), line.number, &self.source, self.scale)
    }

    fn copper_count(&self) -> usize {
        self.builder.board().copper_count()
    }

    fn layer(&self, raw: i64) -> PcbLayerId {
        legacy_layer_to_canonical(u32::try_from(raw).unwrap_or(u32::MAX), self.copper_count())
    }

    /// Legacy layer number limited to the technical layer range.
    fn technical_layer(&self, raw: i64) -> PcbLayerId {
        let raw = raw.clamp(
            i64::from(crate::layers::LEGACY_FIRST_NON_COPPER),
            i64::from(crate::layers::LEGACY_LAST_NON_COPPER),
        );
        self.layer(raw)
    }

    fn warn(&mut self, kind: WarningKind, line: usize, message: String) {
        self.ctx.warn_at(kind, line, 0, message);
    }
}

/// Cursor over the fields of one line with typed accessors.
pub(crate) struct Args<'a, 's> {
    fields: Fields<'a>,
    line: usize,
    source: &'s str,
    scale: f64,
}

impl<'a, 's> Args<'a, 's> {
    pub(crate) fn new(fields: Fields<'a>, line: usize, source: &'s str, scale: f64) -> Self {
        Self {
            fields,
            line,
            source,
            scale,
        }
    }

    fn site(&self, offset: usize) -> Site<'s> {
        Site::new(self.source, self.line, offset)
    }

    fn field(&mut self, what: &str) -> Result<Field<'a>, BoardError> {
        let offset = self.fields.offset();
        self.fields
            .next()
            .ok_or_else(|| self.site(offset).error(format!("missing {what}")))
    }

    pub(crate) fn opt_field(&mut self) -> Option<Field<'a>> {
        self.fields.next()
    }

    pub(crate) fn int(&mut self) -> Result<i64, BoardError> {
        let f = self.field("integer")?;
        parse_int(&f.text, self.site(f.offset))
    }

    pub(crate) fn opt_int(&mut self) -> Result<Option<i64>, BoardError> {
        match self.fields.next() {
            Some(f) => parse_int(&f.text, self.site(f.offset)).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn hex(&mut self) -> Result<u64, BoardError> {
        let f = self.field("hex number")?;
        parse_hex(&f.text, self.site(f.offset))
    }

    pub(crate) fn opt_hex(&mut self) -> Result<Option<u64>, BoardError> {
        match self.fields.next() {
            Some(f) => parse_hex(&f.text, self.site(f.offset)).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn double(&mut self) -> Result<f64, BoardError> {
        let f = self.field("number")?;
        parse_double(&f.text, self.site(f.offset))
    }

    pub(crate) fn biu(&mut self) -> Result<Biu, BoardError> {
        let f = self.field("length")?;
        parse_board_units(&f.text, self.scale, self.site(f.offset))
    }

    pub(crate) fn opt_biu(&mut self) -> Result<Option<Biu>, BoardError> {
        match self.fields.next() {
            Some(f) => parse_board_units(&f.text, self.scale, self.site(f.offset)).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn angle(&mut self) -> Result<f64, BoardError> {
        let f = self.field("angle")?;
        parse_angle(&f.text, ANGLE_SCALE, self.site(f.offset))
    }

    pub(crate) fn opt_angle(&mut self) -> Result<Option<f64>, BoardError> {
        match self.fields.next() {
            Some(f) => parse_angle(&f.text, ANGLE_SCALE, self.site(f.offset)).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn point(&mut self) -> Result<Point, BoardError> {
        Ok(Point::new(self.biu()?, self.biu()?))
    }

    pub(crate) fn size(&mut self) -> Result<Size, BoardError> {
        Ok(Size::new(self.biu()?, self.biu()?))
    }

    pub(crate) fn text(&mut self) -> Result<String, BoardError> {
        Ok(self.field("text")?.text.into_owned())
    }

    pub(crate) fn opt_text(&mut self) -> Option<String> {
        self.fields.next().map(|f| f.text.into_owned())
    }

    pub(crate) fn kiid(&mut self) -> Result<Kiid, BoardError> {
        Ok(Kiid::parse(&self.field("time stamp")?.text))
    }

    pub(crate) fn opt_kiid(&mut self) -> Option<Kiid> {
        self.fields.next().map(|f| Kiid::parse(&f.text))
    }

    /// Raw text of the remaining fields.
    pub(crate) fn remainder(&self) -> &'a str {
        self.fields.remainder()
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> BoardError {
        self.site(self.fields.offset()).error(message)
    }
}
