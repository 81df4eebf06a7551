//! 특수문자 파일명 테스트 데이터
//!
//! URL 서명에서 문제가 되기 쉬운 문자(`'`, `(`, `)`, `@`, `+`, `=`, `&`, 공백 등)를
//! 이름에 포함한 객체를 데이터 디렉토리의 첫 번째 버킷 아래에 만듭니다.
//! 이미 존재하는 파일은 건드리지 않으므로 반복 호출해도 결과가 같습니다.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::EnvError;

/// 버킷 디렉토리가 하나도 없을 때 사용할 이름
pub const DEFAULT_BUCKET: &str = "bucket-1";

/// 버킷 아래 특수문자 파일을 두는 하위 디렉토리
pub const SPECIAL_DIR: &str = "special";

/// 생성할 파일 이름 목록
pub const SPECIAL_CHARACTER_NAMES: &[&str] = &[
    "plus+sign.txt",
    "equals=sign.txt",
    "ampersand&sign.txt",
    "at@sign.txt",
    "quote'mark.txt",
    "paren(1).txt",
    "space in name.txt",
    "dollar$sign.txt",
    "comma,sign.txt",
    "semicolon;sign.txt",
];

/// 특수문자 테스트 데이터를 보장하고 새로 만든 파일 수를 반환합니다.
///
/// # Errors
///
/// 디렉토리를 읽거나 파일을 쓸 수 없으면 `EnvError::Fixture`를 반환합니다.
pub async fn ensure_special_character_fixtures(data_dir: &Path) -> Result<usize, EnvError> {
    let bucket = first_bucket(data_dir).await?;
    let target = bucket.join(SPECIAL_DIR);
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(|e| fixture_err(&target, e))?;

    let mut created = 0;
    for name in SPECIAL_CHARACTER_NAMES {
        let path = target.join(name);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| fixture_err(&path, e))?
        {
            continue;
        }
        tokio::fs::write(&path, format!("{name}\n"))
            .await
            .map_err(|e| fixture_err(&path, e))?;
        debug!(path = %path.display(), "created fixture");
        created += 1;
    }

    info!(
        dir = %target.display(),
        created,
        total = SPECIAL_CHARACTER_NAMES.len(),
        "special character fixtures ready"
    );
    Ok(created)
}

/// 이름순으로 첫 번째 하위 디렉토리를 버킷으로 사용합니다.
async fn first_bucket(data_dir: &Path) -> Result<PathBuf, EnvError> {
    let mut buckets = Vec::new();
    match tokio::fs::read_dir(data_dir).await {
        Ok(mut entries) => {
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| fixture_err(data_dir, e))?
            {
                let is_dir = entry
                    .file_type()
                    .await
                    .map_err(|e| fixture_err(&entry.path(), e))?
                    .is_dir();
                if is_dir {
                    buckets.push(entry.path());
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(fixture_err(data_dir, e)),
    }

    buckets.sort();
    Ok(buckets
        .into_iter()
        .next()
        .unwrap_or_else(|| data_dir.join(DEFAULT_BUCKET)))
}

fn fixture_err(path: &Path, err: std::io::Error) -> EnvError {
    EnvError::Fixture {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
