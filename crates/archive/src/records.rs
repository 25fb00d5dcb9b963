//! Serialized `info` and `content` records.
//!
//! Geometry is stored as fixed-point integers (value x 10) and chartlet angles
//! as tenths of a degree, so records stay compact and locale independent.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use inkline_config::AppIdentity;
use inkline_painting::{
    Chartlet, Color, ElementIndex, LineSegment, Strip, TextureId, from_fixed_point,
    to_fixed_point,
};

/// Name and version of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub version: String,
}

impl From<&AppIdentity> for Identity {
    fn from(app: &AppIdentity) -> Self {
        Self {
            name: app.name.clone(),
            version: app.version.clone(),
        }
    }
}

impl Identity {
    /// This library
    pub fn library() -> Self {
        Self {
            name: "inkline-archive".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The `info` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub version: String,
    pub app: Identity,
    pub library: Identity,
    /// Number of line strip records
    pub lines: usize,
    /// Number of chartlet records
    pub chartlets: usize,
    /// Number of texture files
    pub textures: usize,
    /// Caller supplied identifier, opaque to the archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// The `content` record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Canvas width and height, fixed-point
    pub size: [i32; 2],
    #[serde(rename = "lineStrips", default)]
    pub line_strips: Vec<StripRecord>,
    #[serde(default)]
    pub chartlets: Vec<ChartletRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripRecord {
    #[serde(rename = "i")]
    pub index: ElementIndex,
    #[serde(rename = "b")]
    pub brush: String,
    #[serde(rename = "c")]
    pub color: Color,
    /// Member of the group sharing this index
    #[serde(rename = "g", default, skip_serializing_if = "is_false")]
    pub grouped: bool,
    #[serde(rename = "l")]
    pub segments: Vec<SegmentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    #[serde(rename = "b")]
    pub begin: [i32; 2],
    #[serde(rename = "e")]
    pub end: [i32; 2],
    /// Diameter
    #[serde(rename = "s")]
    pub diameter: i32,
    /// Stamp step
    #[serde(rename = "t")]
    pub step: i32,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartletRecord {
    #[serde(rename = "i")]
    pub index: ElementIndex,
    #[serde(rename = "c")]
    pub center: [i32; 2],
    #[serde(rename = "s")]
    pub size: [i32; 2],
    /// Angle in tenths of a degree
    #[serde(rename = "a")]
    pub angle: i32,
    #[serde(rename = "t")]
    pub texture: TextureId,
    #[serde(rename = "g", default, skip_serializing_if = "is_false")]
    pub grouped: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

pub fn encode_point(point: Vec2) -> [i32; 2] {
    [to_fixed_point(point.x), to_fixed_point(point.y)]
}

pub fn decode_point(point: [i32; 2]) -> Vec2 {
    Vec2::new(from_fixed_point(point[0]), from_fixed_point(point[1]))
}

impl From<&LineSegment> for SegmentRecord {
    fn from(segment: &LineSegment) -> Self {
        Self {
            begin: encode_point(segment.begin),
            end: encode_point(segment.end),
            diameter: to_fixed_point(segment.diameter),
            step: to_fixed_point(segment.step),
            color: segment.color,
        }
    }
}

impl SegmentRecord {
    pub fn to_segment(&self) -> LineSegment {
        LineSegment {
            color: self.color,
            ..LineSegment::new(
                decode_point(self.begin),
                decode_point(self.end),
                from_fixed_point(self.diameter),
                from_fixed_point(self.step),
            )
        }
    }
}

impl StripRecord {
    pub fn from_strip(strip: &Strip, grouped: bool) -> Self {
        Self {
            index: strip.index,
            brush: strip.brush.clone(),
            color: strip.color,
            grouped,
            segments: strip.segments.iter().map(SegmentRecord::from).collect(),
        }
    }

    pub fn to_strip(&self) -> Strip {
        let mut strip = Strip::new(self.brush.clone(), self.color);
        strip.index = self.index;
        strip.segments = self.segments.iter().map(SegmentRecord::to_segment).collect();
        strip
    }
}

impl ChartletRecord {
    pub fn from_chartlet(chartlet: &Chartlet, grouped: bool) -> Self {
        Self {
            index: chartlet.index,
            center: encode_point(chartlet.center),
            size: encode_point(chartlet.size),
            angle: to_fixed_point(chartlet.angle.to_degrees()),
            texture: chartlet.texture,
            grouped,
        }
    }

    pub fn to_chartlet(&self) -> Chartlet {
        let mut chartlet = Chartlet::new(
            decode_point(self.center),
            decode_point(self.size),
            from_fixed_point(self.angle).to_radians(),
            self.texture,
        );
        chartlet.index = self.index;
        chartlet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_record_fields() {
        let segment = LineSegment::new(Vec2::new(1.25, -3.0), Vec2::new(10.0, 0.04), 4.0, 2.5);
        let json = serde_json::to_value(SegmentRecord::from(&segment)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "b": [13, -30], "e": [100, 0], "s": 40, "t": 25 })
        );
    }

    #[test]
    fn test_strip_record_json() {
        let mut strip = Strip::new("pen", Color::rgba(1.0, 0.0, 0.0, 1.0));
        strip.index = 7;
        strip
            .segments
            .push(LineSegment::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 3.0, 1.0));

        let json = serde_json::to_value(StripRecord::from_strip(&strip, false)).unwrap();
        assert_eq!(json["i"], 7);
        assert_eq!(json["b"], "pen");
        assert_eq!(json["c"], "#FF0000FF");
        assert!(json.get("g").is_none());
        assert_eq!(json["l"].as_array().map(Vec::len), Some(1));

        let grouped = serde_json::to_value(StripRecord::from_strip(&strip, true)).unwrap();
        assert_eq!(grouped["g"], true);
    }

    #[test]
    fn test_chartlet_angle_in_tenths_of_degree() {
        let chartlet = Chartlet::new(
            Vec2::new(5.0, 6.0),
            Vec2::new(8.0, 4.0),
            std::f32::consts::FRAC_PI_2,
            TextureId::new(),
        );
        let record = ChartletRecord::from_chartlet(&chartlet, false);
        assert_eq!(record.angle, 900);
        assert_eq!(record.center, [50, 60]);

        let restored = record.to_chartlet();
        assert!((restored.angle - chartlet.angle).abs() < 0.001);
        assert_eq!(restored.texture, chartlet.texture);
    }

    #[test]
    fn test_content_defaults_missing_collections() {
        let content: ContentRecord = serde_json::from_str(r#"{ "size": [100, 50] }"#).unwrap();
        assert_eq!(content.size, [100, 50]);
        assert!(content.line_strips.is_empty());
        assert!(content.chartlets.is_empty());
    }

    #[test]
    fn test_info_identifier_is_optional() {
        let info = InfoRecord {
            version: "1".to_string(),
            app: Identity::from(&AppIdentity::default()),
            library: Identity::library(),
            lines: 1,
            chartlets: 0,
            textures: 0,
            identifier: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("identifier").is_none());
        let parsed: InfoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, info);
    }
}
