//! Test helper: writes small TIFF files carrying real EXIF fields.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use std::io::Cursor;
use std::path::Path;

use super::extractor::RATING;

/// EXIF content of a generated file; `None` leaves the tag out
#[derive(Debug, Clone)]
pub struct ExifFixture {
    pub rating: Option<u16>,
    pub f_number: Option<(u32, u32)>,
    pub iso: Option<u16>,
    pub exposure_time: Option<(u32, u32)>,
    pub focal_length: Option<(u32, u32)>,
    pub lens: Option<&'static str>,
}

impl ExifFixture {
    /// f/2.8, ISO 400, 1/250 s, 35 mm on an XF35mmF1.4 R
    pub fn complete(rating: u16) -> Self {
        Self {
            rating: Some(rating),
            f_number: Some((28, 10)),
            iso: Some(400),
            exposure_time: Some((1, 250)),
            focal_length: Some((35, 1)),
            lens: Some("XF35mmF1.4 R"),
        }
    }

    /// Same settings with a different lens
    pub fn with_lens(rating: u16, lens: &'static str) -> Self {
        Self {
            lens: Some(lens),
            ..Self::complete(rating)
        }
    }

    fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        let mut push = |tag: Tag, value: Value| {
            fields.push(Field {
                tag,
                ifd_num: In::PRIMARY,
                value,
            })
        };
        let rational = |(num, denom): (u32, u32)| Value::Rational(vec![Rational { num, denom }]);

        if let Some(rating) = self.rating {
            push(RATING, Value::Short(vec![rating]));
        }
        if let Some(f) = self.f_number {
            push(Tag::FNumber, rational(f));
        }
        if let Some(iso) = self.iso {
            push(Tag::PhotographicSensitivity, Value::Short(vec![iso]));
        }
        if let Some(t) = self.exposure_time {
            push(Tag::ExposureTime, rational(t));
        }
        if let Some(f) = self.focal_length {
            push(Tag::FocalLength, rational(f));
        }
        if let Some(lens) = self.lens {
            push(Tag::LensModel, Value::Ascii(vec![lens.as_bytes().to_vec()]));
        }
        fields
    }
}

/// Write a TIFF file containing only the fixture's EXIF fields
pub fn write_tiff(path: &Path, fixture: &ExifFixture) {
    let fields = fixture.fields();
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }

    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, true).expect("encode EXIF");
    std::fs::write(path, buf.into_inner()).expect("write fixture");
}
