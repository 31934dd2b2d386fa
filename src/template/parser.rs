use crate::template::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Year,
    Day,
    Month,
    Weekday,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "year" => Some(Self::Year),
            "day" => Some(Self::Day),
            "month" => Some(Self::Month),
            "weekday" => Some(Self::Weekday),
            _ => None,
        }
    }

    pub(crate) fn is_numeric(self) -> bool {
        matches!(self, Self::Year | Self::Day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Filter {
    Pad,
    Short,
    Upper,
    Lower,
}

impl Filter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "pad" => Some(Self::Pad),
            "short" => Some(Self::Short),
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            _ => None,
        }
    }

    fn applies_to(self, field: Field) -> bool {
        match self {
            Self::Pad => field.is_numeric(),
            Self::Short => true,
            Self::Upper | Self::Lower => !field.is_numeric(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Field { field: Field, filters: Vec<Filter> },
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

pub(crate) fn parse_template(input: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut out = Vec::new();
    let mut rest = input;
    let mut offset = 0usize;

    while let Some(open) = rest.find(OPEN) {
        if open > 0 {
            push_literal(&mut out, &rest[..open]);
        }
        let tag_start = offset + open;
        let body_start = open + OPEN.len();
        let Some(close) = rest[body_start..].find(CLOSE) else {
            return Err(TemplateError::new(tag_start, "unterminated '{{' tag"));
        };
        let body = &rest[body_start..body_start + close];
        out.push(parse_tag(body, tag_start + OPEN.len())?);

        let consumed = body_start + close + CLOSE.len();
        rest = &rest[consumed..];
        offset += consumed;
    }

    if !rest.is_empty() {
        push_literal(&mut out, rest);
    }
    Ok(out)
}

fn push_literal(out: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Literal(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Segment::Literal(text.to_owned()));
    }
}

fn parse_tag(body: &str, body_offset: usize) -> Result<Segment, TemplateError> {
    let mut parts = body.split('|');
    let mut part_offset = body_offset;

    // `split` always yields at least one item.
    let head = parts.next().unwrap_or_default();
    let name = head.trim();
    if name.is_empty() {
        return Err(TemplateError::new(body_offset, "empty tag"));
    }
    let name_offset = part_offset + (head.len() - head.trim_start().len());
    let field = Field::parse(name.strip_prefix('.').unwrap_or(name)).ok_or_else(|| {
        TemplateError::new(
            name_offset,
            format!("unknown field '{name}' (expected year, day, month or weekday)"),
        )
    })?;
    part_offset += head.len() + 1;

    let mut filters = Vec::new();
    for part in parts {
        let filter_name = part.trim();
        let filter_offset = part_offset + (part.len() - part.trim_start().len());
        let filter = Filter::parse(filter_name).ok_or_else(|| {
            TemplateError::new(filter_offset, format!("unknown filter '{filter_name}'"))
        })?;
        if !filter.applies_to(field) {
            return Err(TemplateError::new(
                filter_offset,
                format!("filter '{filter_name}' cannot be applied to '{name}'"),
            ));
        }
        filters.push(filter);
        part_offset += part.len() + 1;
    }

    Ok(Segment::Field { field, filters })
}
