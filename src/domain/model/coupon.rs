use crate::domain::error::{CouponError, DomainError};
use crate::domain::model::{CouponId, Money};
use chrono::{DateTime, Utc};

/// クーポンの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponType {
    /// 小計に対するパーセント割引（amountは0〜100）
    Percent,
    /// 固定額割引（amountは最小通貨単位、小計を上限にクランプ）
    Fixed,
}

impl CouponType {
    /// 文字列からCouponTypeを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "percent" => Ok(CouponType::Percent),
            "fixed" => Ok(CouponType::Fixed),
            _ => Err(DomainError::InvalidValue(format!(
                "無効なクーポン種別: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for CouponType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let type_str = match self {
            CouponType::Percent => "percent",
            CouponType::Fixed => "fixed",
        };
        write!(f, "{}", type_str)
    }
}

/// クーポンエンティティ
/// 使用回数の上限管理はストレージ層の条件付き更新が正とする
/// （`times_used <= usage_limit` はそこで常に保証される）
#[derive(Debug, Clone, PartialEq)]
pub struct Coupon {
    id: CouponId,
    code: String,
    coupon_type: CouponType,
    amount: i64,
    min_order_amount: Money,
    usage_limit: Option<u32>,
    times_used: u32,
    active: bool,
    starts_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// 新しいクーポンを作成
    /// パーセント型のamountは0〜100、固定額型のamountは0以上
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CouponId,
        code: String,
        coupon_type: CouponType,
        amount: i64,
        min_order_amount: Money,
        usage_limit: Option<u32>,
        active: bool,
        starts_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        match coupon_type {
            CouponType::Percent => {
                if !(0..=100).contains(&amount) {
                    return Err(DomainError::InvalidValue(format!(
                        "パーセント割引は0〜100で指定してください: {}",
                        amount
                    )));
                }
            }
            CouponType::Fixed => {
                if amount < 0 {
                    return Err(DomainError::InvalidValue(format!(
                        "固定額割引は0以上で指定してください: {}",
                        amount
                    )));
                }
            }
        }

        Ok(Self {
            id,
            code,
            coupon_type,
            amount,
            min_order_amount,
            usage_limit,
            times_used: 0,
            active,
            starts_at,
            expires_at,
        })
    }

    /// データベースから取得したデータでクーポンを再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: CouponId,
        code: String,
        coupon_type: CouponType,
        amount: i64,
        min_order_amount: Money,
        usage_limit: Option<u32>,
        times_used: u32,
        active: bool,
        starts_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            code,
            coupon_type,
            amount,
            min_order_amount,
            usage_limit,
            times_used,
            active,
            starts_at,
            expires_at,
        }
    }

    /// クーポンIDを取得
    pub fn id(&self) -> CouponId {
        self.id
    }

    /// クーポンコードを取得
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 種別を取得
    pub fn coupon_type(&self) -> CouponType {
        self.coupon_type
    }

    /// 割引値を取得（種別によりパーセントまたは固定額）
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 最低注文金額を取得
    pub fn min_order_amount(&self) -> Money {
        self.min_order_amount
    }

    /// 使用回数上限を取得（Noneは無制限）
    pub fn usage_limit(&self) -> Option<u32> {
        self.usage_limit
    }

    /// 現在の使用回数を取得
    pub fn times_used(&self) -> u32 {
        self.times_used
    }

    /// activeフラグを取得
    pub fn active(&self) -> bool {
        self.active
    }

    /// 有効開始日時を取得
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// 失効日時を取得（Noneは無期限）
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// 指定時刻に有効かどうか
    /// activeフラグと [starts_at, expires_at) の期間の両方を満たす必要がある
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if now < self.starts_at {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }

    /// 使用回数に残りがあるか（参考値チェック）
    /// 競合時の最終判定はストレージ層の条件付きインクリメントが行う
    pub fn has_remaining_uses(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.times_used < limit,
            None => true,
        }
    }

    /// 小計に対する割引額を計算
    /// 負にならず、小計を超えない
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let discount = match self.coupon_type {
            CouponType::Percent => subtotal.percentage(self.amount),
            CouponType::Fixed => Money::usd(self.amount.min(subtotal.amount())),
        };
        Money::usd(discount.amount().clamp(0, subtotal.amount()))
    }

    /// クーポンを見積もる
    /// 有効性・最低注文金額・残回数を検証し、割引額を確定する
    pub fn quote(&self, subtotal: Money, now: DateTime<Utc>) -> Result<DiscountQuote, CouponError> {
        if !self.is_active_at(now) {
            return Err(CouponError::Inactive);
        }
        if !subtotal.is_at_least(&self.min_order_amount) {
            return Err(CouponError::MinimumNotMet {
                minimum: self.min_order_amount.amount(),
            });
        }
        if !self.has_remaining_uses() {
            return Err(CouponError::Exhausted);
        }

        Ok(DiscountQuote {
            coupon_id: self.id,
            discount: self.discount_for(subtotal),
        })
    }
}

/// クーポン見積もりの結果
/// チェックアウト確定までの間、割引額を固定する
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountQuote {
    /// 適用するクーポンのID
    pub coupon_id: CouponId,
    /// 確定した割引額
    pub discount: Money,
}
