//! 시드 기반 난수 스트림
//!
//! 하나의 기본 시드에서 블록 초기화, 피드백 라운드, 유닛별 섭동 스트림을 분기시킨다.
//! 같은 (시드, 스트림) 쌍은 스레드 스케줄링과 무관하게 항상 같은 수열을 만든다.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// 블록 초기화 스트림 도메인
pub const INIT_DOMAIN: u64 = 0x1A17_0000_0000_0001;
/// 피드백 섭동 스트림 도메인
pub const FEEDBACK_DOMAIN: u64 = 0xFEED_0000_0000_0002;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// 기본 시드와 스트림 번호로부터 독립적인 하위 시드 생성
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    splitmix64(base ^ splitmix64(stream))
}

/// 하위 시드로 초기화된 RNG
pub fn seeded_rng(base: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(derive_seed(base, stream))
}

/// 표준정규분포 N×N 행렬 (행 우선 순서로 샘플링)
pub fn standard_normal_matrix<R: Rng + ?Sized>(rng: &mut R, n: usize, scale: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |_| rng.sample::<f64, _>(StandardNormal) * scale)
}

/// 표준정규분포 길이 N 벡터
pub fn standard_normal_vector<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Array1<f64> {
    Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal))
}
