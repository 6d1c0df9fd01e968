//! フレーム中継の DTO
//!
//! Broadcaster から受信し Viewer へそのまま中継するフレームメッセージの
//! ワイヤ形式を定義します。フレーム本体（base64 エンコード済み画像）は
//! 不透明な文字列として扱い、デコードしません。

use serde::{Deserialize, Serialize};

/// 1 フレーム分の中継メッセージ
///
/// `metadata` を欠いたフレームも有効で、そのまま中継されます。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameEnvelope {
    /// base64 エンコードされたフレーム画像（不透明データ）
    pub frame: String,
    /// 解析メタデータ（存在する場合のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnnotationMetadata>,
}

/// フレームに付随する解析メタデータ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationMetadata {
    pub frame_index: u64,
    pub masks_detected: usize,
    #[serde(default)]
    pub regions: Vec<Region>,
}

impl AnnotationMetadata {
    /// `masks_detected` を実際の領域数に揃えた正規化済みメタデータを返す
    ///
    /// 上流の解析器がカウントと領域リストを別々に組み立てるため、
    /// 中継前に数を一致させます。
    pub fn normalized(mut self) -> Self {
        self.masks_detected = self.regions.len();
        self
    }
}

/// 検出された 1 領域
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub mask_index: usize,
    pub bounding_box: BoundingBox,
    pub centroid: Centroid,
    pub area_pixels: f64,
    /// 輪郭ポリゴン（[x, y] の列）。省略可。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<[f64; 2]>>,
}

/// 領域の外接矩形
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub width: f64,
    pub height: f64,
}

/// 領域の重心
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_envelope_without_metadata() {
        // テスト項目: metadata を欠いたフレームもデシリアライズできる
        // when (操作):
        let envelope: FrameEnvelope = serde_json::from_str(r#"{"frame":"aGVsbG8="}"#).unwrap();

        // then (期待する結果): metadata は None で、再シリアライズ時も省略される
        assert_eq!(envelope.frame, "aGVsbG8=");
        assert!(envelope.metadata.is_none());
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_metadata_normalized_fixes_mask_count() {
        // テスト項目: normalized() は masks_detected を領域数に揃える
        // given (前提条件): カウントが領域数と食い違うメタデータ
        let metadata = AnnotationMetadata {
            frame_index: 7,
            masks_detected: 5,
            regions: vec![Region {
                mask_index: 0,
                bounding_box: BoundingBox {
                    x_min: 0.0,
                    y_min: 0.0,
                    x_max: 10.0,
                    y_max: 10.0,
                    width: 10.0,
                    height: 10.0,
                },
                centroid: Centroid { x: 5.0, y: 5.0 },
                area_pixels: 100.0,
                polygon: None,
            }],
        };

        // when (操作):
        let normalized = metadata.normalized();

        // then (期待する結果):
        assert_eq!(normalized.masks_detected, 1);
    }
}
