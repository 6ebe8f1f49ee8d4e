/// ファイル転送レコード
///
/// 受信側エンティティのファイル一覧に 1 件だけ存在します。直接追加された
/// ファイルは送信元・受信先ともに所有者自身を指し、最初から転送完了状態です。
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// ファイル名（エンティティ内で一意）
    pub filename: String,
    /// 転送対象の完全な内容
    content: String,
    /// これまでに転送された文字数
    bytes_transmitted: usize,
    /// 送信元エンティティID
    pub sender_id: String,
    /// 受信先エンティティID
    pub receiver_id: String,
}

impl FileRecord {
    /// 転送完了済みのレコードを作成（直接追加用）
    pub fn complete(filename: String, content: String, owner_id: &str) -> Self {
        let bytes_transmitted = content.chars().count();
        Self {
            filename,
            content,
            bytes_transmitted,
            sender_id: owner_id.to_string(),
            receiver_id: owner_id.to_string(),
        }
    }

    /// 転送開始時の空レコードを作成
    pub fn pending(filename: String, content: String, sender_id: &str, receiver_id: &str) -> Self {
        Self {
            filename,
            content,
            bytes_transmitted: 0,
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.chars().count()
    }

    pub fn bytes_transmitted(&self) -> usize {
        self.bytes_transmitted
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_transmitted == self.size()
    }

    /// 転送済み部分（対象内容の先頭 bytes_transmitted 文字）
    pub fn present_content(&self) -> String {
        self.content.chars().take(self.bytes_transmitted).collect()
    }

    /// 転送を進める。完了した場合は true を返す
    pub fn advance(&mut self, rate: usize) -> bool {
        self.bytes_transmitted = self.bytes_transmitted.saturating_add(rate).min(self.size());
        self.is_complete()
    }

    /// 未転送部分から 't' を除去し、即座に転送完了とする
    pub fn flush_remaining_without_t(&mut self) {
        let present = self.present_content();
        let remaining: String = self
            .content
            .chars()
            .skip(self.bytes_transmitted)
            .filter(|c| *c != 't')
            .collect();
        self.content = present + &remaining;
        self.bytes_transmitted = self.size();
    }

    /// 内容全体から 't' を除去し、転送完了とする
    pub fn strip_all_t(&mut self) {
        self.content.retain(|c| c != 't');
        self.bytes_transmitted = self.size();
    }
}

/// エンティティが保持するファイル群と帯域カウンタ
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    files: Vec<FileRecord>,
    /// アップロード中のファイル数
    pub num_uploading: usize,
    /// ダウンロード中のファイル数
    pub num_downloading: usize,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.filename == filename)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut FileRecord> {
        self.files.iter_mut().find(|f| f.filename == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn insert(&mut self, record: FileRecord) {
        self.files.push(record);
    }

    pub fn remove(&mut self, filename: &str) -> Option<FileRecord> {
        let index = self.files.iter().position(|f| f.filename == filename)?;
        Some(self.files.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 保持中ファイルのサイズ合計
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(FileRecord::size).sum()
    }

    /// 未完了ファイル名の一覧（挿入順）
    pub fn pending_filenames(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| !f.is_complete())
            .map(|f| f.filename.clone())
            .collect()
    }

    pub fn begin_upload(&mut self) {
        self.num_uploading += 1;
    }

    pub fn begin_download(&mut self) {
        self.num_downloading += 1;
    }

    pub fn release_upload(&mut self) {
        self.num_uploading = self.num_uploading.saturating_sub(1);
    }

    pub fn release_download(&mut self) {
        self.num_downloading = self.num_downloading.saturating_sub(1);
    }
}
