//! 감정 흉내 - 키워드 빈도로 현재 분위기를 고르고 짧은 멘트를 만든다

use std::collections::BTreeMap;
use std::fmt;

/// 추적하는 감정 (이름 순)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mood {
    Angry,
    Happy,
    Sad,
    Surprised,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Angry, Mood::Happy, Mood::Sad, Mood::Surprised];

    pub fn keyword(self) -> &'static str {
        match self {
            Mood::Angry => "angry",
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// 감정 키워드 카운터
#[derive(Debug, Clone)]
pub struct EmotionTracker {
    levels: BTreeMap<Mood, u32>,
}

impl Default for EmotionTracker {
    fn default() -> Self {
        Self {
            levels: Mood::ALL.iter().map(|&mood| (mood, 0)).collect(),
        }
    }
}

impl EmotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 입력에 포함된 감정 키워드마다 카운트 증가
    pub fn update(&mut self, input: &str) {
        for (mood, level) in self.levels.iter_mut() {
            if input.contains(mood.keyword()) {
                *level += 1;
            }
        }
    }

    pub fn level(&self, mood: Mood) -> u32 {
        self.levels.get(&mood).copied().unwrap_or(0)
    }

    /// 카운트가 가장 높은 감정 (동률이면 이름 순으로 앞선 것)
    pub fn current(&self) -> Mood {
        let mut best = Mood::Angry;
        let mut best_level = 0;
        for (&mood, &level) in &self.levels {
            if level > best_level {
                best = mood;
                best_level = level;
            }
        }
        best
    }
}

/// 입력에 따른 짧은 응답 멘트
pub fn remark_for(text: &str) -> String {
    if text.contains("sad") {
        "I feel a little sad, but I'm here to help!".to_owned()
    } else if text.contains("happy") {
        "I'm glad to hear you're happy!".to_owned()
    } else {
        format!("I'm learning from what you say, {}. Let me think...", text)
    }
}
