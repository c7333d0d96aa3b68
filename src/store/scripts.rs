//! Lua scripts executed by [`super::RedisStore`].
//!
//! Redis runs a script atomically, so every check-and-claim or
//! compare-and-release below is a single indivisible step on the server.
//! A claim key holds its owner's user id and expires on its own; a pid is
//! live-owned by a user only while that key exists and holds the user.

use redis::Script;
use std::sync::LazyLock;

/// Claim a batch of pids.
///
/// KEYS[1] user index, KEYS[2] global index, KEYS[3..] claim keys.
/// ARGV[1] owner, ARGV[2] ttl in ms, ARGV[3] "1" to refresh own claims,
/// ARGV[4..] pids aligned with KEYS[3..].
const CLAIM_SRC: &str = r#"
local owner = ARGV[1]
local ttl = ARGV[2]
local ttl_ms = tonumber(ttl)
local refresh = ARGV[3] == '1'
local claimed = {}

for i = 3, #KEYS do
  local pid = ARGV[i + 1]
  local holder = redis.call('GET', KEYS[i])
  local mine = false
  if not holder then
    redis.call('SET', KEYS[i], owner, 'PX', ttl)
    mine = true
  elseif holder == owner then
    if refresh then
      redis.call('PEXPIRE', KEYS[i], ttl)
    end
    mine = true
  end
  if mine then
    redis.call('SADD', KEYS[1], pid)
    redis.call('SADD', KEYS[2], pid)
    claimed[#claimed + 1] = pid
  end
end

if #claimed > 0 then
  for i = 1, 2 do
    if redis.call('PTTL', KEYS[i]) < ttl_ms then
      redis.call('PEXPIRE', KEYS[i], ttl)
    end
  end
end

return claimed
"#;

/// Release a batch of pids owned by one user.
///
/// KEYS[1] user index, KEYS[2] global index, KEYS[3..] claim keys.
/// ARGV[1] owner, ARGV[2..] pids aligned with KEYS[3..].
const RELEASE_SRC: &str = r#"
local owner = ARGV[1]
local released = {}

for i = 3, #KEYS do
  local pid = ARGV[i - 1]
  if redis.call('GET', KEYS[i]) == owner then
    redis.call('DEL', KEYS[i])
    redis.call('SREM', KEYS[1], pid)
    redis.call('SREM', KEYS[2], pid)
    released[#released + 1] = pid
  end
end

return released
"#;

/// Release everything a user owns.
///
/// KEYS[1] user index, KEYS[2] global index.
/// ARGV[1] owner, ARGV[2] claim key prefix.
const RELEASE_ALL_SRC: &str = r#"
local owner = ARGV[1]
local prefix = ARGV[2]
local released = {}

for _, pid in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  local key = prefix .. pid
  if redis.call('GET', key) == owner then
    redis.call('DEL', key)
    redis.call('SREM', KEYS[2], pid)
    released[#released + 1] = pid
  end
  redis.call('SREM', KEYS[1], pid)
end

return released
"#;

/// Live pids of one user; stale index members are purged.
///
/// KEYS[1] user index. ARGV[1] owner, ARGV[2] claim key prefix.
const USER_PIDS_SRC: &str = r#"
local owner = ARGV[1]
local prefix = ARGV[2]
local live = {}

for _, pid in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  if redis.call('GET', prefix .. pid) == owner then
    live[#live + 1] = pid
  else
    redis.call('SREM', KEYS[1], pid)
  end
end

return live
"#;

/// Live pids of every user; stale index members are purged.
///
/// KEYS[1] global index. ARGV[1] claim key prefix.
const ALL_PIDS_SRC: &str = r#"
local prefix = ARGV[1]
local live = {}

for _, pid in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  if redis.call('EXISTS', prefix .. pid) == 1 then
    live[#live + 1] = pid
  else
    redis.call('SREM', KEYS[1], pid)
  end
end

return live
"#;

pub(super) static CLAIM: LazyLock<Script> = LazyLock::new(|| Script::new(CLAIM_SRC));
pub(super) static RELEASE: LazyLock<Script> = LazyLock::new(|| Script::new(RELEASE_SRC));
pub(super) static RELEASE_ALL: LazyLock<Script> = LazyLock::new(|| Script::new(RELEASE_ALL_SRC));
pub(super) static USER_PIDS: LazyLock<Script> = LazyLock::new(|| Script::new(USER_PIDS_SRC));
pub(super) static ALL_PIDS: LazyLock<Script> = LazyLock::new(|| Script::new(ALL_PIDS_SRC));
