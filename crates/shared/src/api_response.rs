//! # API レスポンスエンベロープ
//!
//! 成功レスポンスの統一形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 成功レスポンスの統一型
///
/// プロモコード API のすべての成功レスポンスはこの形で返す。
/// 「該当なし」を表す場合は `ApiResponse<Option<T>>` で `{ "data": null }` になる。
///
/// ## 使用例
///
/// ```
/// use promopool_shared::ApiResponse;
///
/// let response = ApiResponse::new(vec!["JET-0001"]);
/// assert_eq!(response.data, vec!["JET-0001"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
